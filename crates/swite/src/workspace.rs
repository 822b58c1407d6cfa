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

//! Workspace discovery.

use std::fs;
use std::path::{Path, PathBuf};

use super::config::Config;

pub mod manifest;
pub mod registry;

pub use manifest::Manifest;
pub use registry::Registry;

/// Directories that may contain workspace packages.
pub const PACKAGE_DIRS: &[&str] = &["lib", "packages", "libraries", "modules"];

/// Maximum number of ancestor levels searched during discovery.
const MAX_ASCENT: usize = 10;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Workspace roots.
///
/// A server instance deals with up to three roots: the application root it
/// serves from, the surrounding workspace root (when the application is part
/// of a monorepo), and the framework monorepo (when developing against a
/// checkout of the framework itself). Discovery runs once at startup; the
/// result never changes for the life of the process.
#[derive(Clone, Debug)]
pub struct Workspace {
    /// Application root directory.
    pub app_root: PathBuf,
    /// Workspace root directory, if the application is part of one.
    pub workspace_root: Option<PathBuf>,
    /// Framework monorepo directory, if present.
    pub framework_root: Option<PathBuf>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Workspace {
    /// Discovers the workspace roots for the given configuration.
    ///
    /// Discovery is pure with respect to the file system at the moment of
    /// the call and never modifies anything. Roots that cannot be found are
    /// simply absent - the server degrades gracefully without them.
    #[must_use]
    pub fn discover(config: &Config) -> Self {
        let app_root = fs::canonicalize(&config.app_root)
            .unwrap_or_else(|_| config.app_root.clone());

        let workspace_root = find_workspace_root(&app_root);
        let framework_root =
            find_framework_root(&app_root, &config.framework_dir).or_else(
                || {
                    workspace_root.as_deref().and_then(|root| {
                        find_framework_root(root, &config.framework_dir)
                    })
                },
            );

        Self { app_root, workspace_root, framework_root }
    }

    /// Returns the directory holding the framework's packages.
    #[must_use]
    pub fn framework_packages(&self) -> Option<PathBuf> {
        self.framework_root.as_ref().map(|root| root.join("packages"))
    }

    /// Returns all roots that may hold a `node_modules` directory.
    ///
    /// Ordered by precedence: the application root wins over the workspace
    /// root, which wins over the framework monorepo.
    #[must_use]
    pub fn module_roots(&self) -> Vec<&Path> {
        let mut roots = vec![self.app_root.as_path()];
        roots.extend(self.workspace_root.as_deref());
        roots.extend(self.framework_root.as_deref());
        roots
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Finds the nearest ancestor that is a workspace root.
///
/// A workspace root holds a workspace marker - either a `pnpm-workspace.yaml`
/// or a `package.json` with a `workspaces` field - and at least one of the
/// recognized package-holding directories. The walk is bounded, so a stray
/// marker high up in the file system can't hijack the server.
#[must_use]
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    ancestors(start).find(|dir| {
        has_workspace_marker(dir)
            && PACKAGE_DIRS.iter().any(|name| dir.join(name).is_dir())
    })
}

/// Finds the framework monorepo near the given path.
///
/// Walks up from the given path, accepting a directory when it either is
/// the framework checkout itself, or directly contains one. The framework
/// checkout is recognized by its directory name and a `packages`
/// subdirectory.
#[must_use]
pub fn find_framework_root(start: &Path, name: &str) -> Option<PathBuf> {
    ancestors(start).find_map(|dir| {
        if is_framework_root(&dir, name) {
            return Some(dir);
        }
        let child = dir.join(name);
        is_framework_root(&child, name).then_some(child)
    })
}

/// Returns an iterator over the bounded ancestor chain of a path.
fn ancestors(start: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    start.ancestors().take(MAX_ASCENT).map(Path::to_path_buf)
}

/// Checks whether a directory carries a workspace marker.
fn has_workspace_marker(dir: &Path) -> bool {
    if dir.join("pnpm-workspace.yaml").is_file() {
        return true;
    }

    // A package manifest is a marker if it declares child packages
    let manifest = dir.join("package.json");
    fs::read_to_string(manifest).is_ok_and(|text| {
        serde_json::from_str::<serde_json::Value>(&text)
            .is_ok_and(|json| json.get("workspaces").is_some())
    })
}

/// Checks whether a directory is the framework checkout.
fn is_framework_root(dir: &Path, name: &str) -> bool {
    dir.file_name()
        .and_then(|file_name| file_name.to_str())
        .is_some_and(|file_name| file_name.eq_ignore_ascii_case(name))
        && dir.join("packages").is_dir()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("monorepo");
        fs::create_dir_all(root.join("packages")).unwrap();
        fs::write(root.join("pnpm-workspace.yaml"), "packages:\n").unwrap();

        let app = root.join("packages").join("app");
        fs::create_dir_all(&app).unwrap();

        let found = find_workspace_root(&app).unwrap();
        assert_eq!(found, root);
    }

    #[test]
    fn test_find_workspace_root_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("monorepo");
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(
            root.join("package.json"),
            r#"{ "name": "monorepo", "workspaces": ["lib/*"] }"#,
        )
        .unwrap();

        let start = root.join("lib");
        assert_eq!(find_workspace_root(&start), Some(root));
    }

    #[test]
    fn test_find_workspace_root_absent() {
        let dir = tempfile::tempdir().unwrap();
        let start = dir.path().join("plain");
        fs::create_dir_all(&start).unwrap();
        assert_eq!(find_workspace_root(&start), None);
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("monorepo");
        fs::create_dir_all(root.join("packages/app")).unwrap();
        fs::write(root.join("pnpm-workspace.yaml"), "packages:\n").unwrap();
        fs::create_dir_all(root.join("swiss-lib/packages")).unwrap();

        // Compare against the canonical root, as discovery canonicalizes
        let config = crate::Config::new(root.join("packages/app"));
        let ws = Workspace::discover(&config);
        let root = fs::canonicalize(&root).unwrap();
        assert_eq!(ws.workspace_root.as_deref(), Some(root.as_path()));
        assert_eq!(ws.framework_root, Some(root.join("swiss-lib")));
    }

    #[test]
    fn test_find_framework_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("swiss-lib");
        fs::create_dir_all(root.join("packages")).unwrap();

        // Found when starting inside the checkout
        let start = root.join("packages");
        assert_eq!(find_framework_root(&start, "swiss-lib"), Some(root));

        // Found as a sibling of the starting point
        let start = dir.path().join("app");
        fs::create_dir_all(&start).unwrap();
        assert_eq!(
            find_framework_root(&start, "swiss-lib"),
            Some(dir.path().join("swiss-lib"))
        );
    }
}
