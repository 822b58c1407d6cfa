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

//! Import map.
//!
//! The import map is a pre-computed mapping from bare specifier to canonical
//! URL, written at build time and consulted by the resolver before any
//! dynamic probing. It turns the hot path of resolution - the same handful
//! of framework packages imported by every module - into a hash lookup.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{fs, io};
use tracing::{debug, info};

use crate::urls;
use crate::workspace::{Registry, Workspace};

/// Well-known subpaths pre-resolved for every package.
pub const SUBPATHS: &[&str] = &["components", "pages", "utils", "src"];

/// Location of the import map, relative to the application root.
const LOCATION: &str = ".swite/import-map.json";

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Import map document, as serialized to disk.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Document {
    /// Document format version.
    pub version: String,
    /// Generation time, milliseconds since the epoch.
    pub generated: u64,
    /// Specifier to URL mapping.
    pub imports: BTreeMap<String, String>,
}

// ----------------------------------------------------------------------------

/// Import map.
///
/// The in-memory form of the [`Document`], loaded once at startup. An
/// absent or unreadable document yields an empty map, which simply means
/// every resolution takes the dynamic path.
#[derive(Clone, Debug, Default)]
pub struct ImportMap {
    /// Specifier to URL mapping.
    entries: AHashMap<String, String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl ImportMap {
    /// Creates an empty import map.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the import map of the given application root.
    ///
    /// The document is read exactly once - it is not watched, as it's a
    /// build artifact that only changes together with the dependency tree,
    /// which warrants a server restart anyway.
    #[must_use]
    pub fn load(app_root: &Path) -> Self {
        let path = app_root.join(LOCATION);
        let Ok(text) = fs::read_to_string(&path) else {
            debug!(path = %path.display(), "no import map, resolving dynamically");
            return Self::empty();
        };

        match serde_json::from_str::<Document>(&text) {
            Ok(document) => {
                info!(entries = document.imports.len(), "import map loaded");
                Self { entries: document.imports.into_iter().collect() }
            }
            Err(err) => {
                tracing::warn!(%err, "import map unreadable, ignoring");
                Self::empty()
            }
        }
    }

    /// Returns the URL mapped to the given specifier.
    #[must_use]
    pub fn lookup(&self, specifier: &str) -> Option<&str> {
        self.entries.get(specifier).map(String::as_str)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ----------------------------------------------------------------------------

impl FromIterator<(String, String)> for ImportMap {
    /// Creates an import map from an iterator of entries.
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self { entries: iter.into_iter().collect() }
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Generates the import map document for the given workspace.
///
/// Every registered package contributes its main entry, plus each of the
/// well-known subpaths that resolves to a file. Packages whose entry cannot
/// be resolved are skipped - they'll take the dynamic path at request time.
#[must_use]
pub fn generate(ws: &Workspace, registry: &Registry) -> Document {
    let mut imports = BTreeMap::new();
    for package in registry.all() {
        if let Some(path) = super::resolve_package(&package.path, "") {
            let url = urls::to_url(&path.to_string_lossy(), ws);
            imports.insert(package.name.clone(), url);
        }
        for subpath in SUBPATHS {
            if let Some(path) = super::resolve_package(&package.path, subpath)
            {
                let url = urls::to_url(&path.to_string_lossy(), ws);
                imports.insert(format!("{}/{subpath}", package.name), url);
            }
        }
    }

    Document {
        version: String::from("1.0"),
        generated: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default(),
        imports,
    }
}

/// Writes the import map document below the given application root.
pub fn write(document: &Document, app_root: &Path) -> io::Result<()> {
    let path = app_root.join(LOCATION);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(document)
        .expect("import map serialization");
    fs::write(path, text)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent() {
        let dir = tempfile::tempdir().unwrap();
        let map = ImportMap::load(dir.path());
        assert!(map.is_empty());
    }

    #[test]
    fn test_generate() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("lib/ui");
        std::fs::create_dir_all(pkg.join("src")).unwrap();
        std::fs::write(
            pkg.join("package.json"),
            r#"{ "name": "@demo/ui", "exports": { ".": "./src/index.ts" } }"#,
        )
        .unwrap();
        std::fs::write(pkg.join("src/index.ts"), "").unwrap();
        std::fs::create_dir_all(pkg.join("src/components")).unwrap();
        std::fs::write(pkg.join("src/components/index.ts"), "").unwrap();

        let registry = Registry::new();
        registry.scan(dir.path(), &[]);
        let ws = Workspace {
            app_root: dir.path().to_path_buf(),
            workspace_root: None,
            framework_root: None,
        };

        let document = generate(&ws, &registry);
        assert_eq!(document.version, "1.0");
        assert_eq!(
            document.imports.get("@demo/ui"),
            Some(&String::from("/lib/ui/src/index.ts")),
        );
        assert_eq!(
            document.imports.get("@demo/ui/components"),
            Some(&String::from("/lib/ui/src/components/index.ts")),
        );
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let document = Document {
            version: String::from("1.0"),
            generated: 0,
            imports: BTreeMap::from([(
                String::from("@swissjs/core"),
                String::from("/swiss-packages/core/src/index.ts"),
            )]),
        };
        write(&document, dir.path()).unwrap();

        let map = ImportMap::load(dir.path());
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.lookup("@swissjs/core"),
            Some("/swiss-packages/core/src/index.ts")
        );
        assert_eq!(map.lookup("@swissjs/other"), None);
    }
}
