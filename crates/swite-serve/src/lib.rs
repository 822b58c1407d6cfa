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

//! Non-blocking HTTP/1.1 server with WebSocket support.
//!
//! This server exists to back a development-time module server, so it favors
//! simplicity over generality: it's deliberately implemented with sync Rust
//! on top of [`mio`] to avoid async runtimes, keeps dependencies minimal,
//! and is not intended to face the public internet. Responses are answered
//! through a chain of middlewares, and WebSocket connections upgraded from
//! HTTP act as a fan-out channel for push messages.

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]

pub mod handler;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;
