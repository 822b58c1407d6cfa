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

//! Development-time module server for the Swiss framework.
//!
//! On every browser request, the server locates a source file inside a
//! possibly-large multi-package workspace, compiles it to browser script,
//! rewrites every module specifier to a URL the browser can fetch, caches
//! the result under a dependency-aware key, and notifies connected browsers
//! when any watched file changes.
//!
//! The crate is organized along those responsibilities:
//!
//! - [`workspace`] discovers workspace and framework roots and indexes
//!   packages by name.
//! - [`urls`] maps file paths to browser URLs and back, keeping the
//!   internal framework prefix from ever reaching a browser.
//! - [`resolver`] turns module specifiers into canonical URLs, aided by a
//!   pre-computed import map.
//! - [`rewriter`] substitutes every static specifier in a script.
//! - [`cache`] holds compiled modules until their source or dependencies
//!   change.
//! - [`pipeline`] orchestrates compile, rewrite, cache and response per
//!   request.
//! - [`watcher`] classifies file changes and feeds the push channel.
//! - [`server`] wires everything into an HTTP server with a WebSocket
//!   push channel.

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod compiler;
pub mod config;
pub mod pipeline;
pub mod resolver;
pub mod rewriter;
pub mod server;
pub mod urls;
pub mod watcher;
pub mod workspace;

pub use cache::Cache;
pub use config::Config;
pub use resolver::Resolver;
pub use rewriter::Rewriter;
pub use workspace::{Registry, Workspace};
