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

//! Change propagation.
//!
//! The watcher observes the workspace and classifies every settled change
//! into one of three update kinds: stylesheets swap live, component and
//! page sources hot-reload, everything else reloads the document. Each
//! classification is serialized to the push payload and broadcast to all
//! connected browsers; the matching cache entry is dropped along the way.
//!
//! Broadcasts are fire-and-forget. A slow subscriber may miss events - on
//! reconnect the client script triggers a full reload, so missed events
//! cost a moment, not correctness.

use crossbeam::channel::Sender;
use mio::Waker;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

use swite_watch::{Agent, Filter};

use super::cache::Cache;
use super::config::Config;
use super::workspace::Workspace;

/// Extensions classified as stylesheets.
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass"];

/// Extensions eligible for hot reloading.
const HOT_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "ui", "uix"];

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Update kind, as understood by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    /// Live stylesheet swap.
    Style,
    /// Module re-import with a cache-busting query parameter.
    Hot,
    /// Full document reload.
    Reload,
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Classified change event.
#[derive(Clone, Debug)]
pub struct Update {
    /// Absolute path of the changed file.
    pub path: std::path::PathBuf,
    /// Update kind.
    pub kind: UpdateKind,
    /// Event time, milliseconds since the epoch.
    pub timestamp: u64,
}

// ----------------------------------------------------------------------------

/// File watcher.
///
/// A thin wrapper around the file agent that owns classification, cache
/// invalidation and payload serialization.
pub struct Watcher {
    /// File agent.
    agent: Agent,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl UpdateKind {
    /// Returns the wire name of the update kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Style => "style",
            UpdateKind::Hot => "hot",
            UpdateKind::Reload => "reload",
        }
    }
}

impl Update {
    /// Creates an update for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: classify(path),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or_default(),
        }
    }

    /// Serializes the update to the push payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use swite::watcher::Update;
    ///
    /// // Create update and serialize it
    /// let update = Update::new(Path::new("/app/styles/main.css"));
    /// let payload = update.to_json();
    /// assert!(payload.contains(r#""updateType":"style""#));
    /// ```
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "type": "update",
            "path": self.path.to_string_lossy(),
            "updateType": self.kind.as_str(),
            "timestamp": self.timestamp,
        })
        .to_string()
    }
}

impl Watcher {
    /// Creates a file watcher for the given workspace.
    ///
    /// Settled changes invalidate their cache entry and are broadcast to
    /// the push channel; the waker interrupts the server's poll loop so
    /// the broadcast drains immediately. Watcher errors are logged and
    /// swallowed - the affected subtree goes quiet until restart, but the
    /// server keeps serving.
    pub fn new(
        config: &Config, ws: &Workspace, cache: Arc<Cache>,
        sender: Sender<String>, waker: Option<Arc<Waker>>,
    ) -> swite_watch::Result<Self> {
        let filter = Filter::default().ignore(".swite");
        let agent = Agent::with_filter(
            Duration::from_millis(config.debounce_ms),
            filter,
            move |res| {
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(%err, "watcher error, subtree may go quiet");
                        return Ok(());
                    }
                };

                // Stale compilations must not outlive the change
                cache.invalidate(event.path());

                // Broadcast and wake the server's poll loop - send errors
                // mean the server is gone, which terminates the agent
                let update = Update::new(event.path());
                sender.send(update.to_json())?;
                if let Some(waker) = &waker {
                    waker.wake()?;
                }
                Ok(())
            },
        );

        // Watch the workspace root when there is one, as it covers the
        // application root; otherwise the application root itself
        match &ws.workspace_root {
            Some(root) => agent.watch(root)?,
            None => agent.watch(&ws.app_root)?,
        }

        Ok(Self { agent })
    }

    /// Checks whether the watcher has terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.agent.is_terminated()
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Classifies a changed path into an update kind.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use swite::watcher::{classify, UpdateKind};
///
/// // Classify changed paths
/// assert_eq!(classify(Path::new("a/styles.css")), UpdateKind::Style);
/// assert_eq!(
///     classify(Path::new("a/components/b.tsx")),
///     UpdateKind::Hot,
/// );
/// assert_eq!(classify(Path::new("a/index.html")), UpdateKind::Reload);
/// ```
#[must_use]
pub fn classify(path: &Path) -> UpdateKind {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    if STYLE_EXTENSIONS.contains(&ext) {
        return UpdateKind::Style;
    }
    if HOT_EXTENSIONS.contains(&ext) && in_hot_location(path) {
        return UpdateKind::Hot;
    }
    UpdateKind::Reload
}

/// Checks whether a path lies below a components or pages directory.
fn in_hot_location(path: &Path) -> bool {
    path.components().any(|component| {
        matches!(
            component,
            Component::Normal(name) if name == "components" || name == "pages"
        )
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classify() {
        let test_cases = vec![
            ("styles/main.css", UpdateKind::Style),
            ("src/theme.scss", UpdateKind::Style),
            ("a/b/components/c.ts", UpdateKind::Hot),
            ("packages/ui/components/button.tsx", UpdateKind::Hot),
            ("src/pages/home.uix", UpdateKind::Hot),
            ("src/util.ts", UpdateKind::Reload),
            ("index.html", UpdateKind::Reload),
            ("README.md", UpdateKind::Reload),
        ];

        for (path, expected) in test_cases {
            assert_eq!(
                classify(&PathBuf::from(path)),
                expected,
                "Failed for: {path}"
            );
        }
    }

    #[test]
    fn test_payload_shape() {
        let update = Update::new(Path::new("/x/components/button.tsx"));
        let payload: serde_json::Value =
            serde_json::from_str(&update.to_json()).unwrap();

        assert_eq!(payload["type"], "update");
        assert_eq!(payload["path"], "/x/components/button.tsx");
        assert_eq!(payload["updateType"], "hot");
        assert!(payload["timestamp"].as_u64().is_some());
    }
}
