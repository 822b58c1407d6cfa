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

//! Development server.
//!
//! Assembles the middleware stack, the diagnostic endpoints and the push
//! channel into a running HTTP server on its own thread. The returned
//! handle carries the waker that connects the file watcher to the server's
//! poll loop, and the effective address - which may differ from the
//! configured one when the port was busy.

use anyhow::{anyhow, Context as _};
use crossbeam::channel::{unbounded, Receiver};
use mio::Waker;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use tracing::info;

use swite_serve::handler::{Handler, Stack};
use swite_serve::http::{Header, Request, Response, Status};
use swite_serve::middleware::{
    Middleware, StaticFiles, WebSocketHandshake,
};
use swite_serve::router::Router;
use swite_serve::server::Server;

use super::compiler::RouteSource;
use super::config::Config;
use super::pipeline::{Modules, Pipeline};
use super::urls;

mod client;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Running server handle.
pub struct ServerHandle {
    /// Waker for interrupting the poll loop.
    pub waker: Arc<Waker>,
    /// Effective listen address.
    pub addr: SocketAddr,
}

/// Middleware forbidding client-side caching.
///
/// Development responses must never be cached - a stale module in the
/// browser's cache defeats every invalidation the server performs. The
/// full trio of headers is required, as older proxies ignore
/// `Cache-Control` but honor `Pragma` and `Expires`.
struct NoCache;

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Middleware for NoCache {
    /// Processes the given request.
    fn process(&self, req: Request, next: &dyn Handler) -> Response {
        let mut res = next.handle(req);
        res.headers.insert(
            Header::CacheControl,
            "no-cache, no-store, must-revalidate",
        );
        res.headers.insert(Header::Pragma, "no-cache");
        res.headers.insert(Header::Expires, 0);
        res
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Creates the development server and starts it on its own thread.
///
/// The receiver feeds the push channel: whatever arrives on it while the
/// waker is triggered is broadcast to every connected browser.
pub fn create_server(
    config: &Config, pipeline: Arc<Pipeline>, routes: Arc<dyn RouteSource>,
    receiver: Receiver<String>,
) -> anyhow::Result<ServerHandle> {
    // The scratch directory holds the import map and other build artifacts;
    // downstream tooling expects it to exist
    let _ = std::fs::create_dir_all(config.scratch_dir());

    let stack = build_stack(pipeline, routes);
    let addr = config.dev_addr.clone();

    // Run the server on its own thread, extracting the waker and the
    // effective address through a one-shot channel - the waker is what
    // lets the file watcher interrupt the poll loop
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let mut server = match Server::new(stack, addr.as_str()) {
            Ok(server) => server,
            Err(err) => {
                let _ = tx.send(Err(err));
                return;
            }
        };
        let _ = tx.send(
            server
                .local_addr()
                .map(|addr| (server.waker(), addr)),
        );
        loop {
            if let Err(err) = server.poll(Some(&receiver)) {
                tracing::error!(%err, "server poll failed");
                break;
            }
        }
    });

    // Report the effective address - when the configured port was busy,
    // an ephemeral one was chosen, and clients must learn about it
    let (waker, addr) = rx
        .recv()
        .context("server thread died before reporting")?
        .map_err(|err| anyhow!(err))?;
    info!(%addr, "development server listening");
    Ok(ServerHandle { waker, addr })
}

/// Builds the middleware stack of the development server.
///
/// Requests nothing answers end at the stack's plain text 404 - never an
/// HTML fallback, which would poison module caches under script URLs.
fn build_stack(
    pipeline: Arc<Pipeline>, routes: Arc<dyn RouteSource>,
) -> Stack {
    let app_root = pipeline.workspace().app_root.clone();
    Stack::new()
        .with(NoCache)
        .with(WebSocketHandshake::default())
        .with(endpoints(pipeline.clone(), routes))
        .with(Modules::new(pipeline))
        .with(StaticFiles::new("/public/", app_root.join("public")))
        .with(StaticFiles::new("/assets/", app_root.join("assets")))
}

/// Builds the router for the server's own endpoints.
fn endpoints(
    pipeline: Arc<Pipeline>, routes: Arc<dyn RouteSource>,
) -> Router {
    let diagnose = pipeline.clone();
    let clear = pipeline;

    Router::new()
        .route("/__swite_hmr_client", |_req: Request| {
            Response::from_script(client::CLIENT)
        })
        .route("/__swite_routes", move |_req: Request| {
            let table = serde_json::to_string(&routes.routes())
                .unwrap_or_else(|_| String::from("[]"));
            let len = table.len();
            Response::new()
                .status(Status::Ok)
                .header(Header::ContentType, "application/json")
                .header(Header::ContentLength, len)
                .body(table)
        })
        .route("/__swite_diagnose", move |req: Request| {
            let Some(url) = req.uri.param("url") else {
                return Response::from_text(
                    Status::BadRequest,
                    "Missing url parameter",
                );
            };
            let report = diagnose_url(&diagnose, &url);
            let len = report.len();
            Response::new()
                .status(Status::Ok)
                .header(Header::ContentType, "application/json")
                .header(Header::ContentLength, len)
                .body(report)
        })
        .route("/__swite_clear_cache", move |_req: Request| {
            clear.cache().clear();
            let page = concat!(
                "<!doctype html><title>Cache cleared</title>",
                "<p>Compilation cache cleared. ",
                "<a href=\"/\">Back to the application</a></p>",
            );
            Response::new()
                .status(Status::Ok)
                .header(Header::ContentType, "text/html; charset=utf-8")
                .header(Header::ContentLength, page.len())
                .body(page)
        })
}

/// Reports what the server would serve for the given URL.
fn diagnose_url(pipeline: &Pipeline, url: &str) -> String {
    let ws = pipeline.workspace();
    let file = urls::resolve_file_path(url, ws);
    let handler = match url {
        url if url.starts_with("/node_modules/") => "vendor",
        url if url.ends_with(".ui") || url.ends_with(".uix") => "ui",
        url if url.ends_with(".ts") || url.ends_with(".tsx") => "ts",
        url if url.ends_with(".js") || url.ends_with(".mjs") => "js",
        _ => "static",
    };

    serde_json::json!({
        "url": url,
        "file": file.as_ref().map(|path| path.to_string_lossy()),
        "exists": file.as_ref().is_some_and(|path| path.is_file()),
        "handler": handler,
        "cached": file
            .as_ref()
            .is_some_and(|path| pipeline.cache().contains(path)),
    })
    .to_string()
}
