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

//! Request pipeline.
//!
//! Per-extension handlers orchestrate the compile, rewrite, cache and
//! respond sequence. Errors never escape a handler: a missing file becomes
//! a plain text 404, a compiler refusal a plain text 500, an unknown
//! package a redirect to the CDN. HTML never appears under a script URL -
//! a single-page fallback answering module requests poisons browser module
//! caches in ways that survive reloads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

use swite_serve::handler::Handler;
use swite_serve::http::{Method, Request, Response, Status};
use swite_serve::middleware::Middleware;

use super::cache::Cache;
use super::compiler::{Compile, Loader, Transform, TransformOptions};
use super::resolver::{cdn_url, classify, Resolver, Specifier};
use super::urls;
use super::workspace::Workspace;
use super::{rewriter, Rewriter};

pub mod styles;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Request pipeline.
pub struct Pipeline {
    /// Workspace roots.
    ws: Arc<Workspace>,
    /// Module resolver.
    resolver: Arc<Resolver>,
    /// Import rewriter.
    rewriter: Rewriter,
    /// Compilation cache.
    cache: Arc<Cache>,
    /// Component compiler.
    compile: Arc<dyn Compile>,
    /// Code transformer.
    transform: Arc<dyn Transform>,
}

/// Middleware dispatching module requests to the pipeline.
pub struct Modules {
    /// Request pipeline.
    pipeline: Arc<Pipeline>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Pipeline {
    /// Creates a request pipeline.
    #[must_use]
    pub fn new(
        ws: Arc<Workspace>, resolver: Arc<Resolver>, cache: Arc<Cache>,
        compile: Arc<dyn Compile>, transform: Arc<dyn Transform>,
    ) -> Self {
        let rewriter = Rewriter::new(resolver.clone(), ws.clone());
        Self { ws, resolver, rewriter, cache, compile, transform }
    }

    /// Serves a module request, if the URL addresses one.
    ///
    /// Returns `None` for URLs the pipeline does not own - stylesheets,
    /// images, markup - which then fall through to the static handlers.
    #[must_use]
    pub fn serve(&self, url: &str) -> Option<Response> {
        if url.starts_with("/node_modules/") {
            return Some(self.serve_vendor(url));
        }

        match extension(url) {
            "ui" | "uix" | "ts" | "tsx" | "js" | "mjs" | "jsx" => {
                Some(self.dispatch_source(url))
            }
            _ => None,
        }
    }

    /// Resolves the file path of a module URL and hands off by extension.
    fn dispatch_source(&self, url: &str) -> Response {
        let Some(path) = urls::resolve_file_path(url, &self.ws) else {
            return not_found(url);
        };

        match extension(url) {
            "ui" | "uix" => self.serve_ui(&path, url),
            "ts" | "tsx" => self.serve_ts(&path, url),
            _ => self.serve_js(&path, url),
        }
    }

    /// Serves a component source, compiled and rewritten.
    fn serve_ui(&self, path: &Path, url: &str) -> Response {
        // The build lock guarantees at most one compilation in flight per
        // key - a concurrent requester blocks here, then hits the cache
        let lock = self.cache.build_lock(path);
        let _guard = lock.lock().expect("build lock poisoned");
        if let Some(hit) =
            self.cache.get(path, |compiled| self.deps_of(compiled, path))
        {
            return Response::from_script(hit);
        }

        let Ok(source) = fs::read_to_string(path) else {
            return not_found(url);
        };
        let compiled = match self.compile.compile(&source, path) {
            Ok(compiled) => compiled,
            Err(err) => {
                error!(
                    path = %path.display(), url, stage = "compile", %err,
                    "compilation failed"
                );
                return Response::from_text(
                    Status::InternalServerError,
                    format!("Compile error in {url}: {err}"),
                );
            }
        };

        // Stylesheets out, internal prefix out, then rewrite imports
        let compiled = styles::strip(&compiled);
        let compiled = urls::publish(&compiled);
        let rewritten = self.rewriter.rewrite(&compiled, path);

        self.cache.set(path, compiled, rewritten.clone(), |compiled| {
            self.deps_of(compiled, path)
        });
        Response::from_script(rewritten)
    }

    /// Serves a typed source through the code transformer.
    ///
    /// A missing `.ts` with a component sibling is the component handler's
    /// request wearing the wrong extension, so it delegates.
    fn serve_ts(&self, path: &Path, url: &str) -> Response {
        if !path.is_file() {
            for ext in ["ui", "uix"] {
                let sibling = path.with_extension(ext);
                if sibling.is_file() {
                    return self.serve_ui(&sibling, &corrected(url, ext));
                }
            }
            return not_found(url);
        }

        let lock = self.cache.build_lock(path);
        let _guard = lock.lock().expect("build lock poisoned");
        if let Some(hit) =
            self.cache.get(path, |compiled| self.deps_of(compiled, path))
        {
            return Response::from_script(hit);
        }

        let Ok(source) = fs::read_to_string(path) else {
            return not_found(url);
        };
        let loader = if extension(url) == "tsx" {
            Loader::Tsx
        } else {
            Loader::Ts
        };
        let opts =
            TransformOptions { loader, path: path.to_path_buf() };
        let compiled = match self.transform.transform(&source, &opts) {
            Ok(compiled) => compiled,
            Err(err) => {
                error!(
                    path = %path.display(), url, stage = "compile", %err,
                    "transformation failed"
                );
                return Response::from_text(
                    Status::InternalServerError,
                    format!("Compile error in {url}: {err}"),
                );
            }
        };

        let compiled = urls::publish(&compiled);
        let rewritten = self.rewriter.rewrite(&compiled, path);
        self.cache.set(path, compiled, rewritten.clone(), |compiled| {
            self.deps_of(compiled, path)
        });
        Response::from_script(rewritten)
    }

    /// Serves plain script, rewritten but not compiled.
    ///
    /// A missing `.js` triggers the extension cross-resolution: the first
    /// hit among the source siblings answers under the corrected URL.
    fn serve_js(&self, path: &Path, url: &str) -> Response {
        if !path.is_file() {
            for ext in ["ts", "ui", "uix"] {
                let sibling = path.with_extension(ext);
                if !sibling.is_file() {
                    continue;
                }
                let url = corrected(url, ext);
                return if ext == "ts" {
                    self.serve_ts(&sibling, &url)
                } else {
                    self.serve_ui(&sibling, &url)
                };
            }
            return not_found(url);
        }

        match fs::read_to_string(path) {
            Ok(source) => {
                let rewritten = self.rewriter.rewrite(&source, path);
                Response::from_script(rewritten)
            }
            Err(_) => not_found(url),
        }
    }

    /// Serves package internals as-is, without rewriting.
    ///
    /// Installed packages ship pre-bundled script whose imports are their
    /// own business. Missing files get a case-insensitive second chance;
    /// on total failure, a plausible package name redirects to the CDN.
    fn serve_vendor(&self, url: &str) -> Response {
        let rel = url.trim_start_matches('/');
        if let Some(path) = urls::resolve_file_path(url, &self.ws) {
            if path.is_file() {
                if let Ok(res) = Response::from_file(&path) {
                    return res;
                }
            }
        }

        // Second chance: restore the on-disk case below each root
        for root in self.ws.module_roots() {
            let Some(cased) = urls::on_disk_case(root, Path::new(rel)) else {
                continue;
            };
            let path = root.join(&cased);
            if path.is_file() {
                if let Ok(res) = Response::from_file(&path) {
                    return res;
                }
            }
        }

        // Redirect plausible package names to the CDN
        let specifier = rel.trim_start_matches("node_modules/");
        if matches!(classify(specifier), Specifier::Bare | Specifier::Scoped)
        {
            debug!(url, "vendor miss, redirecting to CDN");
            return Response::redirect(cdn_url(specifier));
        }
        not_found(url)
    }

    /// Extracts the dependency paths of compiled output.
    ///
    /// Every absolute or scoped specifier is resolved through the module
    /// resolver; only specifiers that land on the file system are
    /// retained. This list is what ties a cache entry to the world around
    /// it.
    fn deps_of(&self, compiled: &str, importer: &Path) -> Vec<PathBuf> {
        rewriter::specifiers(compiled)
            .into_iter()
            .filter(|specifier| {
                matches!(
                    classify(specifier),
                    Specifier::Absolute
                        | Specifier::Scoped
                        | Specifier::Framework
                )
            })
            .filter_map(|specifier| {
                let url = self.resolver.resolve(&specifier, importer);
                urls::resolve_file_path(&url, &self.ws)
            })
            .collect()
    }

    /// Returns the compilation cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Returns the workspace roots.
    #[must_use]
    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.ws
    }
}

// ----------------------------------------------------------------------------

impl Modules {
    /// Creates the module middleware.
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Middleware for Modules {
    /// Processes the given request.
    fn process(&self, req: Request, next: &dyn Handler) -> Response {
        if !matches!(req.method, Method::Get | Method::Head) {
            return next.handle(req);
        }

        match self.pipeline.serve(&req.uri.path) {
            Some(res) if req.method == Method::Head => res.body([]),
            Some(res) => res,
            None => next.handle(req),
        }
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Returns the extension of a URL path.
fn extension(url: &str) -> &str {
    Path::new(url)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
}

/// Replaces the extension of a URL.
fn corrected(url: &str, ext: &str) -> String {
    match url.rfind('.') {
        Some(offset) => format!("{}.{ext}", &url[..offset]),
        None => format!("{url}.{ext}"),
    }
}

/// Returns the plain text 404 response for a URL.
fn not_found(url: &str) -> Response {
    debug!(url, "file not found");
    Response::from_text(Status::NotFound, format!("File not found: {url}"))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler;
    use crate::resolver::ImportMap;
    use crate::workspace::Registry;
    use std::fs;
    use swite_serve::http::Header;

    /// Compiler stub that prepends a marker comment.
    fn stub_compile(source: &str, _path: &Path) -> compiler::Result<String> {
        Ok(format!("/* compiled */\n{source}"))
    }

    /// Transformer stub that passes the source through.
    fn stub_transform(
        source: &str, _opts: &TransformOptions,
    ) -> compiler::Result<String> {
        Ok(source.to_owned())
    }

    fn pipeline(app: &Path) -> Pipeline {
        let ws = Arc::new(Workspace {
            app_root: app.to_path_buf(),
            workspace_root: None,
            framework_root: None,
        });
        let resolver = Arc::new(Resolver::new(
            ws.clone(),
            Arc::new(Registry::new()),
            ImportMap::empty(),
            String::from("@swissjs"),
        ));
        Pipeline::new(
            ws,
            resolver,
            Arc::new(Cache::new(1000)),
            Arc::new(stub_compile),
            Arc::new(stub_transform),
        )
    }

    #[test]
    fn test_serve_ui() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("App.uix"), "").unwrap();
        fs::write(
            src.join("index.ui"),
            "import './theme.css';\nimport { App } from './App.uix';\n",
        )
        .unwrap();

        let pipeline = pipeline(dir.path());
        let res = pipeline.serve("/src/index.ui").unwrap();
        assert_eq!(res.status, Status::Ok);
        assert_eq!(
            res.headers.get(Header::ContentType),
            Some("application/javascript; charset=utf-8"),
        );

        let body = String::from_utf8(res.body).unwrap();
        assert!(body.contains("'/src/App.uix'"));
        assert!(!body.contains(".css"));
    }

    #[test]
    fn test_serve_ui_cached() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.ui"), "const x = 1;\n").unwrap();

        let pipeline = pipeline(dir.path());
        let first = pipeline.serve("/src/index.ui").unwrap();
        let second = pipeline.serve("/src/index.ui").unwrap();
        assert_eq!(first.body, second.body);
        assert_eq!(pipeline.cache().len(), 1);
    }

    #[test]
    fn test_serve_missing() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let res = pipeline.serve("/src/absent.ui").unwrap();
        assert_eq!(res.status, Status::NotFound);
        assert_eq!(
            res.headers.get(Header::ContentType),
            Some("text/plain; charset=utf-8"),
        );
        assert_eq!(res.body, b"File not found: /src/absent.ui");
    }

    #[test]
    fn test_cross_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("App.uix"), "const x = 1;\n").unwrap();

        // A request for App.js is answered by the component source
        let pipeline = pipeline(dir.path());
        let res = pipeline.serve("/src/App.js").unwrap();
        assert_eq!(res.status, Status::Ok);
        assert_eq!(
            res.headers.get(Header::ContentType),
            Some("application/javascript; charset=utf-8"),
        );
    }

    #[test]
    fn test_serve_vendor_case() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/reflect-metadata");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("Reflect.js"), "module.exports = {};\n").unwrap();

        let pipeline = pipeline(dir.path());
        let res = pipeline
            .serve("/node_modules/reflect-metadata/reflect.js")
            .unwrap();
        assert_eq!(res.status, Status::Ok);
        assert_eq!(res.body, b"module.exports = {};\n");
    }

    #[test]
    fn test_serve_vendor_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let res = pipeline.serve("/node_modules/left-pad/index.js").unwrap();
        assert_eq!(res.status, Status::Found);
        assert_eq!(
            res.headers.get(Header::Location),
            Some("https://cdn.jsdelivr.net/npm/left-pad/index.js/+esm"),
        );
    }

    #[test]
    fn test_serve_other_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        assert!(pipeline.serve("/src/styles.css").is_none());
        assert!(pipeline.serve("/index.html").is_none());
        assert!(pipeline.serve("/assets/logo.svg").is_none());
    }
}
