// Copyright (c) 2025-2026 Swite and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! Handler.

use std::fmt;

use super::http::{Request, Response, Status};

pub mod stack;

pub use stack::Stack;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Handler.
///
/// Handlers represent the executable form of a request processing chain.
/// Unlike middlewares, which define composable layers, handlers package
/// those layers into a single unit of execution, always returning a
/// [`Response`] for every given [`Request`].
///
/// A handler sits at the end of every request processing chain, definitely
/// answering the request with no next middleware to defer to.
pub trait Handler: Send + Sync {
    /// Handles the given request.
    ///
    /// This method is invoked with a request and is required to return a
    /// response. It must be infallible and should not panic - errors are
    /// expressed as error responses.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::handler::Handler;
    /// use swite_serve::http::{Request, Response, Status};
    ///
    /// // Define handler answering every request with plain text
    /// let handler = |_req: Request| Response::from_text(Status::Ok, "ok");
    ///
    /// // Handle request with handler
    /// let res = handler.handle(Request::new().uri("/"));
    /// assert_eq!(res.status, Status::Ok);
    /// ```
    fn handle(&self, req: Request) -> Response;
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Fallback handler.
///
/// This handler always returns "404 Not Found" as plain text, and is the
/// default end of every middleware chain.
pub struct NotFound;

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Handler for NotFound {
    /// Handles the given request.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::handler::{Handler, NotFound};
    /// use swite_serve::http::{Request, Status};
    ///
    /// // Handle request with handler
    /// let res = NotFound.handle(Request::new().uri("/"));
    /// assert_eq!(res.status, Status::NotFound);
    /// ```
    #[inline]
    fn handle(&self, req: Request) -> Response {
        let message = format!("File not found: {}", req.uri.path);
        Response::from_text(Status::NotFound, message)
    }
}

// ----------------------------------------------------------------------------

impl fmt::Debug for Box<dyn Handler> {
    /// Formats the handler for debugging.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Box<dyn Handler>")
    }
}

// ----------------------------------------------------------------------------
// Blanket implementations
// ----------------------------------------------------------------------------

impl<F, R> Handler for F
where
    F: Fn(Request) -> R + Send + Sync,
    R: Into<Response>,
{
    #[inline]
    fn handle(&self, req: Request) -> Response {
        self(req).into()
    }
}
