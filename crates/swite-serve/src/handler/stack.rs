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

//! Stack.

use crate::handler::{Handler, NotFound};
use crate::http::{Request, Response};
use crate::middleware::Middleware;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Stack.
///
/// Stacks compose multiple middlewares into one, passing the request from
/// one middleware to the next until one answers it. The final fallback is
/// the [`NotFound`] handler, so a stack is always a complete [`Handler`].
///
/// # Examples
///
/// ```
/// use swite_serve::handler::{Handler, Stack};
/// use swite_serve::http::{Request, Response, Status};
///
/// // Create stack with middleware
/// let stack = Stack::new()
///     .with(|req: Request, next: &dyn Handler| {
///         if req.uri.path == "/ping" {
///             Response::from_text(Status::Ok, "pong")
///         } else {
///             next.handle(req)
///         }
///     });
///
/// // Handle request with stack
/// let res = stack.handle(Request::new().uri("/ping"));
/// assert_eq!(res.status, Status::Ok);
/// ```
#[derive(Debug, Default)]
pub struct Stack {
    /// Middlewares.
    middlewares: Vec<Box<dyn Middleware>>,
}

/// Stack handler.
///
/// The stack handler keeps track of all middlewares that haven't been
/// invoked yet, i.e. are next in line to be called. When no middleware is
/// left, the [`NotFound`] fallback answers the request.
struct StackHandler<'a> {
    /// Remaining middlewares.
    middlewares: &'a [Box<dyn Middleware>],
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Stack {
    /// Creates a stack.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a middleware to the stack.
    #[must_use]
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware,
    {
        self.middlewares.push(Box::new(middleware));
        self
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Handler for Stack {
    /// Handles the given request.
    fn handle(&self, req: Request) -> Response {
        StackHandler { middlewares: &self.middlewares }.handle(req)
    }
}

impl Handler for StackHandler<'_> {
    /// Handles the given request.
    ///
    /// The first middleware is invoked with a handler that represents the
    /// rest of the stack, so each middleware decides whether to answer the
    /// request or defer to whatever comes after it.
    fn handle(&self, req: Request) -> Response {
        match self.middlewares.split_first() {
            Some((middleware, rest)) => {
                middleware.process(req, &StackHandler { middlewares: rest })
            }
            None => NotFound.handle(req),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Status;

    #[test]
    fn test_order() {
        let stack = Stack::new()
            .with(|req: Request, next: &dyn Handler| {
                if req.uri.path == "/a" {
                    Response::from_text(Status::Ok, "a")
                } else {
                    next.handle(req)
                }
            })
            .with(|req: Request, next: &dyn Handler| {
                if req.uri.path == "/b" {
                    Response::from_text(Status::Ok, "b")
                } else {
                    next.handle(req)
                }
            });

        let res = stack.handle(Request::new().uri("/b"));
        assert_eq!(res.body, b"b");

        let res = stack.handle(Request::new().uri("/c"));
        assert_eq!(res.status, Status::NotFound);
    }
}
