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

//! End-to-end pipeline scenarios against a fixture workspace.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use swite::compiler::{self, TransformOptions};
use swite::pipeline::Pipeline;
use swite::resolver::ImportMap;
use swite::rewriter::Rewriter;
use swite::{Cache, Registry, Resolver, Workspace};
use swite_serve::http::{Header, Status};

// ----------------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------------

/// Fixture workspace with an application and a framework checkout.
struct Fixture {
    /// Owned temporary directory.
    _dir: tempfile::TempDir,
    /// Application root.
    app: PathBuf,
    /// Workspace roots.
    ws: Arc<Workspace>,
}

impl Fixture {
    /// Creates the fixture workspace.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(app.join("src")).unwrap();

        // Framework checkout with a core package whose export points into
        // the built tree, while the source twin exists
        let core = dir.path().join("swiss-lib/packages/core");
        fs::create_dir_all(core.join("src")).unwrap();
        fs::create_dir_all(core.join("dist")).unwrap();
        fs::write(
            core.join("package.json"),
            r#"{ "name": "@swissjs/core", "exports": { ".": "./dist/index.js" } }"#,
        )
        .unwrap();
        fs::write(core.join("src/index.ts"), "export class SwissApp {}\n")
            .unwrap();

        let ws = Arc::new(Workspace {
            app_root: app.clone(),
            workspace_root: None,
            framework_root: Some(dir.path().join("swiss-lib")),
        });
        Self { _dir: dir, app, ws }
    }

    /// Creates a pipeline over the fixture.
    fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            self.ws.clone(),
            self.resolver(),
            Arc::new(Cache::new(1000)),
            Arc::new(passthrough_compile),
            Arc::new(passthrough_transform),
        )
    }

    /// Creates a resolver over the fixture.
    fn resolver(&self) -> Arc<Resolver> {
        Arc::new(Resolver::new(
            self.ws.clone(),
            Arc::new(Registry::new()),
            ImportMap::empty(),
            String::from("@swissjs"),
        ))
    }
}

/// Compiler stub passing the component source through.
fn passthrough_compile(
    source: &str, _path: &Path,
) -> compiler::Result<String> {
    Ok(source.to_owned())
}

/// Transformer stub passing the typed source through.
fn passthrough_transform(
    source: &str, _opts: &TransformOptions,
) -> compiler::Result<String> {
    Ok(source.to_owned())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[test]
fn test_serve_component_with_framework_import() {
    let fixture = Fixture::new();
    fs::write(fixture.app.join("src/App.uix"), "export class App {}\n")
        .unwrap();
    fs::write(
        fixture.app.join("src/index.ui"),
        concat!(
            "import { SwissApp } from \"@swissjs/core\";\n",
            "import { App } from \"./App.uix\";\n",
        ),
    )
    .unwrap();

    let pipeline = fixture.pipeline();
    let res = pipeline.serve("/src/index.ui").unwrap();
    assert_eq!(res.status, Status::Ok);
    assert_eq!(
        res.headers.get(Header::ContentType),
        Some("application/javascript; charset=utf-8"),
    );

    let body = String::from_utf8(res.body).unwrap();
    assert!(body.contains(r#"from "/swiss-packages/core/src/index.ts""#));
    assert!(body.contains(r#"from "/src/App.uix""#));
    assert!(!body.contains("@swissjs/core"));
    assert!(!body.to_lowercase().contains("/swiss-lib/"));
}

#[test]
fn test_serve_twice_hits_cache() {
    let fixture = Fixture::new();
    fs::write(
        fixture.app.join("src/index.ui"),
        "export const answer = 42;\n",
    )
    .unwrap();

    let pipeline = fixture.pipeline();
    let first = pipeline.serve("/src/index.ui").unwrap();
    let second = pipeline.serve("/src/index.ui").unwrap();

    // Byte-identical responses, single cache entry
    assert_eq!(first.body, second.body);
    assert_eq!(pipeline.cache().len(), 1);
    assert!(pipeline
        .cache()
        .contains(&fixture.app.join("src/index.ui")));
}

#[test]
fn test_modification_invalidates() {
    let fixture = Fixture::new();
    let source = fixture.app.join("src/index.ui");
    fs::write(&source, "export const version = 1;\n").unwrap();

    let pipeline = fixture.pipeline();
    let first = pipeline.serve("/src/index.ui").unwrap();
    assert!(String::from_utf8(first.body)
        .unwrap()
        .contains("version = 1"));

    // Rewrite the source with a strictly newer timestamp
    std::thread::sleep(Duration::from_millis(20));
    fs::write(&source, "export const version = 2;\n").unwrap();

    let second = pipeline.serve("/src/index.ui").unwrap();
    assert!(String::from_utf8(second.body)
        .unwrap()
        .contains("version = 2"));
}

#[test]
fn test_rewrite_internal_prefix_and_built_path() {
    let fixture = Fixture::new();
    let rewriter = Rewriter::new(fixture.resolver(), fixture.ws.clone());

    let out = rewriter.rewrite(
        "import X from '/swiss-lib/packages/core/dist/index.js';\n",
        &fixture.app.join("src/index.ui"),
    );
    assert!(out.contains("/swiss-packages/core/src/index.ts"));
    assert!(!out.to_lowercase().contains("/swiss-lib/"));
}

#[test]
fn test_vendor_preserves_on_disk_case() {
    let fixture = Fixture::new();
    let pkg = fixture.app.join("node_modules/reflect-metadata");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("Reflect.js"), "module.exports = {};\n").unwrap();

    let pipeline = fixture.pipeline();
    let res = pipeline
        .serve("/node_modules/reflect-metadata/reflect.js")
        .unwrap();
    assert_eq!(res.status, Status::Ok);
    assert_eq!(res.body, b"module.exports = {};\n");

    // The canonicalizer emits the on-disk case
    let requested = pkg.join("reflect.js");
    let url = swite::urls::to_url(&requested.to_string_lossy(), &fixture.ws);
    assert_eq!(url, "/node_modules/reflect-metadata/Reflect.js");
}

#[test]
fn test_rewriting_is_idempotent() {
    let fixture = Fixture::new();
    fs::write(fixture.app.join("src/App.uix"), "export class App {}\n")
        .unwrap();
    let rewriter = Rewriter::new(fixture.resolver(), fixture.ws.clone());

    let source = concat!(
        "import { SwissApp } from \"@swissjs/core\";\n",
        "import { App } from \"./App.uix\";\n",
        "import missing from \"@unknown/pkg\";\n",
        "const dynamic = await import(def.componentUrl);\n",
    );
    let importer = fixture.app.join("src/index.ui");

    let once = rewriter.rewrite(source, &importer);
    let twice = rewriter.rewrite(&once, &importer);
    assert_eq!(once, twice);
}
