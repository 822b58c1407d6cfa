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

//! Package registry.

use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::manifest::Manifest;

/// Directory names that are never descended into.
const SKIP_DIRS: &[&str] = &["node_modules", "dist", ".git", ".swite"];

/// Maximum traversal depth of a scan.
const MAX_DEPTH: usize = 15;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Registered package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    /// Package name, possibly scoped.
    pub name: String,
    /// Package directory.
    pub path: PathBuf,
}

// ----------------------------------------------------------------------------

/// Package registry.
///
/// The registry maps package names to their directories, built by a single
/// recursive scan over the workspace roots. It is shared across the server
/// and read-mostly: lookups take a read lock, while `scan` and `rescan`
/// serialize behind the write lock. Readers receive cloned snapshots, never
/// references into the index.
#[derive(Debug, Default)]
pub struct Registry {
    /// Registry state.
    inner: RwLock<Inner>,
}

/// Registry state.
#[derive(Debug, Default)]
struct Inner {
    /// Name to package index.
    index: AHashMap<String, Package>,
    /// Roots of the last scan.
    roots: Vec<PathBuf>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Registry {
    /// Creates an empty package registry.
    ///
    /// The registry must be populated with [`Registry::scan`] before any
    /// lookup returns something useful.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the given roots for packages.
    ///
    /// Repeated calls with the same roots are no-ops - use
    /// [`Registry::rescan`] to pick up packages added since the last scan.
    ///
    /// The traversal is depth-first with a bounded depth. A directory whose
    /// manifest carries a `name` field is recorded - unless the name is
    /// taken, in which case the first discovery wins and the duplicate is
    /// logged. Descent continues below package directories, as nested
    /// packages are permitted.
    pub fn scan<P>(&self, primary: P, extra: &[PathBuf])
    where
        P: AsRef<Path>,
    {
        let mut roots = vec![primary.as_ref().to_path_buf()];
        roots.extend(extra.iter().cloned());

        let mut inner = self.inner.write().expect("registry poisoned");
        if inner.roots == roots {
            return;
        }
        inner.index = build(&roots);
        inner.roots = roots;
    }

    /// Replays the last scan over the recorded roots.
    pub fn rescan(&self) {
        let mut inner = self.inner.write().expect("registry poisoned");
        let roots = inner.roots.clone();
        inner.index = build(&roots);
    }

    /// Returns the package registered under the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Package> {
        let inner = self.inner.read().expect("registry poisoned");
        inner.index.get(name).cloned()
    }

    /// Returns a snapshot of all registered packages.
    #[must_use]
    pub fn all(&self) -> Vec<Package> {
        let inner = self.inner.read().expect("registry poisoned");
        let mut packages: Vec<Package> =
            inner.index.values().cloned().collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        packages
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Builds the package index for the given roots.
fn build(roots: &[PathBuf]) -> AHashMap<String, Package> {
    let mut index: AHashMap<String, Package> = AHashMap::new();
    for root in roots {
        let walk = WalkDir::new(root)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // The root itself is always visited, even when it would be
                // skipped by name, e.g. a checkout below a dotted directory
                entry.depth() == 0 || !is_skipped(entry.path())
            });

        for entry in walk.filter_map(Result::ok) {
            if !entry.file_type().is_dir() {
                continue;
            }

            // Record the package, unless its name is already taken
            let Some(manifest) = Manifest::load(entry.path()) else {
                continue;
            };
            let Some(name) = manifest.name else {
                continue;
            };
            if let Some(existing) = index.get(&name) {
                warn!(
                    name,
                    first = %existing.path.display(),
                    duplicate = %entry.path().display(),
                    "duplicate package name, keeping first"
                );
                continue;
            }
            index.insert(
                name.clone(),
                Package { name, path: entry.path().to_path_buf() },
            );
        }
    }
    debug!(packages = index.len(), "registry scan complete");
    index
}

/// Checks whether a directory is skipped during traversal.
///
/// Dotted directories are skipped wholesale, along with dependency trees,
/// build output and the server's own scratch directory.
fn is_skipped(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            SKIP_DIRS.contains(&name) || name.starts_with('.')
        })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn package(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{ "name": "{name}" }}"#),
        )
        .unwrap();
    }

    #[test]
    fn test_scan() {
        let dir = tempfile::tempdir().unwrap();
        package(&dir.path().join("packages/ui"), "@demo/ui");
        package(&dir.path().join("packages/core"), "@demo/core");
        package(&dir.path().join("packages/ui/nested"), "@demo/nested");

        let registry = Registry::new();
        registry.scan(dir.path(), &[]);

        assert!(registry.find("@demo/ui").is_some());
        assert!(registry.find("@demo/core").is_some());
        assert!(registry.find("@demo/nested").is_some());
        assert!(registry.find("@demo/other").is_none());
        assert_eq!(registry.all().len(), 3);
    }

    #[test]
    fn test_scan_skips() {
        let dir = tempfile::tempdir().unwrap();
        package(&dir.path().join("node_modules/dep"), "dep");
        package(&dir.path().join("dist/pkg"), "built");
        package(&dir.path().join(".hidden/pkg"), "hidden");
        package(&dir.path().join("lib/pkg"), "kept");

        let registry = Registry::new();
        registry.scan(dir.path(), &[]);

        assert!(registry.find("dep").is_none());
        assert!(registry.find("built").is_none());
        assert!(registry.find("hidden").is_none());
        assert!(registry.find("kept").is_some());
    }

    #[test]
    fn test_scan_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        package(&dir.path().join("a/pkg"), "@demo/pkg");
        package(&dir.path().join("b/pkg"), "@demo/pkg");

        let registry = Registry::new();
        registry.scan(dir.path(), &[]);

        // First discovery in traversal order wins
        let found = registry.find("@demo/pkg").unwrap();
        assert_eq!(found.path, dir.path().join("a/pkg"));
    }

    #[test]
    fn test_rescan() {
        let dir = tempfile::tempdir().unwrap();
        package(&dir.path().join("lib/one"), "one");

        let registry = Registry::new();
        registry.scan(dir.path(), &[]);
        assert!(registry.find("two").is_none());

        // Scanning again is a no-op, rescanning picks up the new package
        package(&dir.path().join("lib/two"), "two");
        registry.scan(dir.path(), &[]);
        assert!(registry.find("two").is_none());
        registry.rescan();
        assert!(registry.find("two").is_some());
    }
}
