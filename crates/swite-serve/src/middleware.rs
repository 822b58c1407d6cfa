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

//! Middleware.

use std::fmt;

use super::handler::Handler;
use super::http::{Request, Response};

mod files;
mod websocket;

pub use files::StaticFiles;
pub use websocket::WebSocketHandshake;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Middleware.
///
/// Middlewares are the building blocks of the request processing pipeline.
/// They can modify, handle or answer a given [`Request`] with a
/// [`Response`], or forward it to the next [`Handler`], which is either
/// another middleware or the final handler.
///
/// A middleware consumes the request, which aligns with the idea of a
/// request moving through a pipeline. Closures matching the signature of
/// [`Middleware::process`] implement this trait automatically.
pub trait Middleware: Send + Sync + 'static {
    /// Processes the given request.
    ///
    /// This method is invoked with a request and is expected to either
    /// answer it with a response, or pass it on to the given handler.
    /// Request processing is infallible - errors must be handled
    /// gracefully, e.g. by returning a plain text error response.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::handler::{Handler, NotFound};
    /// use swite_serve::http::{Request, Response, Status};
    /// use swite_serve::middleware::Middleware;
    ///
    /// // Define middleware
    /// struct Pong;
    ///
    /// // Create middleware implementation
    /// impl Middleware for Pong {
    ///     fn process(&self, req: Request, next: &dyn Handler) -> Response {
    ///         if req.uri.path == "/ping" {
    ///             Response::from_text(Status::Ok, "pong")
    ///         } else {
    ///             next.handle(req)
    ///         }
    ///     }
    /// }
    ///
    /// // Handle request with middleware
    /// let res = Pong.process(Request::new().uri("/ping"), &NotFound);
    /// assert_eq!(res.status, Status::Ok);
    /// ```
    fn process(&self, req: Request, next: &dyn Handler) -> Response;
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl fmt::Debug for Box<dyn Middleware> {
    /// Formats the middleware for debugging.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Box<dyn Middleware>")
    }
}

// ----------------------------------------------------------------------------
// Blanket implementations
// ----------------------------------------------------------------------------

impl<F, R> Middleware for F
where
    F: Fn(Request, &dyn Handler) -> R + Send + Sync + 'static,
    R: Into<Response>,
{
    #[inline]
    fn process(&self, req: Request, next: &dyn Handler) -> Response {
        self(req, next).into()
    }
}
