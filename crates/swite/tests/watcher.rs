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

//! Change propagation against a live file system.

use crossbeam::channel::unbounded;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use swite::watcher::Watcher;
use swite::{Cache, Config, Workspace};

#[test]
fn test_component_change_broadcasts_hot_update() {
    let dir = tempfile::tempdir().unwrap();
    let app = dir.path().join("app");
    fs::create_dir_all(app.join("packages/ui/components")).unwrap();

    let config = Config {
        app_root: app.clone(),
        debounce_ms: 50,
        ..Config::default()
    };
    let ws = Workspace {
        app_root: app.clone(),
        workspace_root: None,
        framework_root: None,
    };

    let (sender, receiver) = unbounded();
    let cache = Arc::new(Cache::new(1000));
    let _watcher =
        Watcher::new(&config, &ws, cache, sender, None).unwrap();

    // Give the watcher a moment to attach, then create a component
    std::thread::sleep(Duration::from_millis(250));
    fs::write(
        app.join("packages/ui/components/button.tsx"),
        "export const Button = 1;\n",
    )
    .unwrap();

    // The settled change arrives as a hot update payload - scan for it, as
    // some platforms also report the parent directory
    let update = loop {
        let payload = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("no broadcast received");
        let update: serde_json::Value =
            serde_json::from_str(&payload).unwrap();
        if update["path"]
            .as_str()
            .unwrap()
            .ends_with("components/button.tsx")
        {
            break update;
        }
    };
    assert_eq!(update["type"], "update");
    assert_eq!(update["updateType"], "hot");
    assert!(update["timestamp"].as_u64().is_some());
}

#[test]
fn test_stylesheet_change_broadcasts_style_update() {
    let dir = tempfile::tempdir().unwrap();
    let app = dir.path().join("app");
    fs::create_dir_all(app.join("styles")).unwrap();
    fs::write(app.join("styles/main.css"), "body {}\n").unwrap();

    let config = Config {
        app_root: app.clone(),
        debounce_ms: 50,
        ..Config::default()
    };
    let ws = Workspace {
        app_root: app.clone(),
        workspace_root: None,
        framework_root: None,
    };

    let (sender, receiver) = unbounded();
    let cache = Arc::new(Cache::new(1000));
    let _watcher =
        Watcher::new(&config, &ws, cache, sender, None).unwrap();

    std::thread::sleep(Duration::from_millis(250));
    fs::write(app.join("styles/main.css"), "body { margin: 0 }\n").unwrap();

    let update = loop {
        let payload = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("no broadcast received");
        let update: serde_json::Value =
            serde_json::from_str(&payload).unwrap();
        if update["path"].as_str().unwrap().ends_with("styles/main.css") {
            break update;
        }
    };
    assert_eq!(update["updateType"], "style");
}
