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

//! Router.

use crate::handler::Handler;
use crate::http::{Request, Response};
use crate::middleware::Middleware;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Router.
///
/// The router dispatches requests by path pattern using the [`matchit`]
/// crate, and acts as a middleware: requests that don't match any route
/// fall through to the next handler, so the router composes naturally with
/// prefix-based middlewares in a [`Stack`][].
///
/// [`Stack`]: crate::handler::Stack
///
/// # Examples
///
/// ```
/// use swite_serve::handler::{Handler, Stack};
/// use swite_serve::http::{Request, Response, Status};
/// use swite_serve::router::Router;
///
/// // Create router and add route
/// let router = Router::new()
///     .route("/ping", |_req: Request| {
///         Response::from_text(Status::Ok, "pong")
///     });
///
/// // Handle request with router inside a stack
/// let stack = Stack::new().with(router);
/// let res = stack.handle(Request::new().uri("/ping"));
/// assert_eq!(res.status, Status::Ok);
/// ```
#[derive(Default)]
pub struct Router {
    /// Route table.
    routes: matchit::Router<Box<dyn Handler>>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Router {
    /// Creates a router.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route to the router.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid or conflicts with an existing route,
    /// as route tables are wired up at startup and a bad pattern is a
    /// programming error, not a runtime condition.
    #[must_use]
    pub fn route<P, H>(mut self, pattern: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Handler + 'static,
    {
        self.routes
            .insert(pattern.into(), Box::new(handler))
            .expect("route table invariant");
        self
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Middleware for Router {
    /// Processes the given request.
    fn process(&self, req: Request, next: &dyn Handler) -> Response {
        match self.routes.at(&req.uri.path) {
            Ok(matched) => matched.value.handle(req),
            Err(_) => next.handle(req),
        }
    }
}
