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

//! Package manifest.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Package manifest.
///
/// Only the fields the resolver cares about are modeled. The exports map is
/// kept as raw JSON, since its shape varies wildly in the wild - strings,
/// subpath maps, conditional objects, and arbitrary nestings of the three.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Manifest {
    /// Package name, possibly scoped.
    pub name: Option<String>,
    /// Main entry, legacy field.
    pub main: Option<String>,
    /// Module entry, legacy field.
    pub module: Option<String>,
    /// Exports map, raw.
    pub exports: Option<Value>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Manifest {
    /// Loads the manifest of the given package directory.
    ///
    /// Absence and malformed JSON both yield `None` - a package we cannot
    /// understand is a package we do not know.
    #[must_use]
    pub fn load(dir: &Path) -> Option<Self> {
        let text = fs::read_to_string(dir.join("package.json")).ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Resolves a subpath against the exports map.
    ///
    /// The subpath is given without the leading `./`, with the empty string
    /// denoting the package root. Keys are tried in three rounds: exact
    /// match, trailing-directory match, and first-segment match. When no
    /// exports map is present, the legacy `module`/`main` fields answer the
    /// root subpath.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite::workspace::Manifest;
    ///
    /// // Create manifest and resolve subpath
    /// let manifest: Manifest = serde_json::from_str(
    ///     r#"{ "name": "x", "exports": { ".": "./src/index.ts" } }"#,
    /// ).unwrap();
    /// assert_eq!(manifest.resolve_export(""), Some("./src/index.ts".into()));
    /// ```
    #[must_use]
    pub fn resolve_export(&self, subpath: &str) -> Option<String> {
        let Some(exports) = &self.exports else {
            // Without an exports map, only the package root is addressable
            return subpath
                .is_empty()
                .then(|| self.module.clone().or_else(|| self.main.clone()))
                .flatten();
        };

        // A bare string or conditional object covers the package root
        if !exports.is_object()
            || exports.as_object().is_some_and(is_conditional)
        {
            return subpath.is_empty().then(|| target(exports)).flatten();
        }
        let map = exports.as_object()?;

        // Round 1: exact key
        let key = normalize(subpath);
        if let Some(value) = map.get(&key) {
            return target(value);
        }

        // Round 2: trailing-directory match, longest key first
        let mut keys: Vec<&String> =
            map.keys().filter(|key| key.ends_with('/')).collect();
        keys.sort_by_key(|key| std::cmp::Reverse(key.len()));
        for prefix in keys {
            if let Some(rest) = key.strip_prefix(prefix.as_str()) {
                let base = target(&map[prefix])?;
                return Some(format!("{}{rest}", base.trim_end_matches('/')));
            }
        }

        // Round 3: first-segment match
        let first = subpath.split('/').next().unwrap_or_default();
        if !first.is_empty() {
            if let Some(value) = map.get(&normalize(first)) {
                return target(value);
            }
        }
        None
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Normalizes a subpath into exports-map key form.
fn normalize(subpath: &str) -> String {
    if subpath.is_empty() {
        String::from(".")
    } else {
        format!("./{subpath}")
    }
}

/// Checks whether an exports object is a conditional block.
///
/// Subpath maps key by `.`-prefixed paths; conditional blocks key by
/// condition names like `import` and `default`.
fn is_conditional(map: &serde_json::Map<String, Value>) -> bool {
    map.keys().all(|key| !key.starts_with('.'))
}

/// Extracts the import-or-default target from an exports value.
fn target(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map
            .get("import")
            .or_else(|| map.get("default"))
            .and_then(target),
        _ => None,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> Manifest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_resolve_export() {
        let test_cases = vec![
            // Bare string covers the package root
            (r#"{ "exports": "./dist/index.js" }"#, "", Some("./dist/index.js")),
            (r#"{ "exports": "./dist/index.js" }"#, "sub", None),
            // Conditional object covers the package root
            (
                r#"{ "exports": { "import": "./src/index.ts" } }"#,
                "",
                Some("./src/index.ts"),
            ),
            // Exact key
            (
                r#"{ "exports": { ".": "./src/index.ts",
                                  "./utils": "./src/utils.ts" } }"#,
                "utils",
                Some("./src/utils.ts"),
            ),
            // Nested conditional target
            (
                r#"{ "exports": { ".": { "import": "./a.js",
                                         "default": "./b.js" } } }"#,
                "",
                Some("./a.js"),
            ),
            // Trailing-directory match
            (
                r#"{ "exports": { "./components/": "./src/components/" } }"#,
                "components/button",
                Some("./src/components/button"),
            ),
            // First-segment match
            (
                r#"{ "exports": { "./components": "./src/components.ts" } }"#,
                "components/button",
                Some("./src/components.ts"),
            ),
            // Legacy main field
            (r#"{ "main": "./index.js" }"#, "", Some("./index.js")),
            (
                r#"{ "main": "./index.js", "module": "./index.mjs" }"#,
                "",
                Some("./index.mjs"),
            ),
        ];

        for (json, subpath, expected) in test_cases {
            assert_eq!(
                manifest(json).resolve_export(subpath).as_deref(),
                expected,
                "Failed for: {json} / {subpath}"
            );
        }
    }
}
