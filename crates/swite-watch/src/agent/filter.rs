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

//! Event filter.

use ahash::AHashSet;
use std::path::Path;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Event filter.
///
/// The filter decides which paths below a watched root are allowed to emit
/// events. Dependency trees, version control metadata and build output are
/// excluded by default, as changes inside them are either machine-generated
/// or irrelevant for live feedback, and tend to arrive in large bursts.
///
/// Only the part of a path below the watched root is inspected, so a project
/// that itself lives inside a dotted directory is not accidentally silenced.
#[derive(Clone, Debug)]
pub struct Filter {
    /// Ignored directory names.
    names: AHashSet<String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Filter {
    /// Creates an empty event filter.
    #[must_use]
    pub fn empty() -> Self {
        Self { names: AHashSet::new() }
    }

    /// Adds a directory name to ignore.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_watch::Filter;
    ///
    /// // Create event filter and ignore scratch directory
    /// let filter = Filter::default()
    ///     .ignore(".swite");
    /// ```
    #[must_use]
    pub fn ignore<S>(mut self, name: S) -> Self
    where
        S: Into<String>,
    {
        self.names.insert(name.into());
        self
    }

    /// Checks whether the given path is allowed to emit events.
    ///
    /// The path must be relative to the watched root. A path is rejected if
    /// any of its components matches an ignored name, or is a dotted
    /// directory that is not explicitly part of the ignore list.
    #[must_use]
    pub fn allows<P>(&self, path: P) -> bool
    where
        P: AsRef<Path>,
    {
        !path.as_ref().components().any(|component| {
            component.as_os_str().to_str().is_some_and(|name| {
                self.names.contains(name) || name.starts_with('.')
            })
        })
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Filter {
    /// Creates the default event filter.
    fn default() -> Self {
        Self::empty()
            .ignore("node_modules")
            .ignore("dist")
            .ignore(".git")
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows() {
        let test_cases = vec![
            ("src/App.uix", true),
            ("packages/ui/components/button.tsx", true),
            ("node_modules/reflect-metadata/Reflect.js", false),
            ("packages/ui/dist/index.js", false),
            (".git/HEAD", false),
            (".swite/import-map.json", false),
            ("src/.cache/tmp", false),
        ];

        let filter = Filter::default();
        for (path, expected) in test_cases {
            assert_eq!(filter.allows(path), expected, "Failed for: {path}");
        }
    }

    #[test]
    fn test_ignore() {
        let filter = Filter::empty().ignore("target");
        assert!(!filter.allows("target/debug/build"));
        assert!(filter.allows("node_modules/pkg/index.js"));
    }
}
