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

//! Middleware for serving static files.

use std::path::PathBuf;

use crate::handler::Handler;
use crate::http::{Method, Request, Response};
use crate::middleware::Middleware;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Middleware for serving static files.
///
/// Serves files below a base directory under a URL prefix, without any
/// processing. In a development server nothing is ever conditional - there
/// are no 304 responses and no date headers, as the response post-processor
/// forbids caching anyway.
pub struct StaticFiles {
    /// URL prefix.
    prefix: String,
    /// Base path.
    base: PathBuf,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl StaticFiles {
    /// Creates a middleware for serving static files.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::middleware::StaticFiles;
    ///
    /// // Create middleware
    /// let middleware = StaticFiles::new("/public/", "app/public");
    /// ```
    pub fn new<S, P>(prefix: S, base: P) -> Self
    where
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self { prefix: prefix.into(), base: base.into() }
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Middleware for StaticFiles {
    /// Processes the given request.
    fn process(&self, req: Request, next: &dyn Handler) -> Response {
        if !matches!(req.method, Method::Get | Method::Head) {
            return next.handle(req);
        }

        // Only answer requests below our prefix
        let Some(suffix) = req.uri.path.strip_prefix(&self.prefix) else {
            return next.handle(req);
        };

        // Attempt to load the file, or delegate to the next handler - the
        // final fallback produces the plain text 404 this server requires
        let full = self.base.join(suffix.trim_start_matches('/'));
        match Response::from_file(&full) {
            Ok(res) => {
                if req.method == Method::Head {
                    res.body([])
                } else {
                    res
                }
            }
            Err(_) => next.handle(req),
        }
    }
}
