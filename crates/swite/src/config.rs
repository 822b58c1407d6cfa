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

//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::result;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Configuration error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration failed to parse.
    #[error("configuration invalid: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration result.
pub type Result<T = ()> = result::Result<T, Error>;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Server configuration.
///
/// Constructed by the command-line entry point, which merges defaults with
/// the user's dotfile. Everything the core needs to know about the project
/// lives here; none of it changes after startup.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Application root directory.
    pub app_root: PathBuf,
    /// Address the development server binds to.
    pub dev_addr: String,
    /// Directory name of the framework monorepo.
    pub framework_dir: String,
    /// Package scope of the framework.
    pub framework_scope: String,
    /// Additional workspace roots to scan for packages.
    pub extra_roots: Vec<PathBuf>,
    /// Compilation cache capacity.
    pub cache_capacity: usize,
    /// Debounce interval for the file watcher, in milliseconds.
    pub debounce_ms: u64,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Config {
    /// Creates a configuration for the given application root.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite::Config;
    ///
    /// // Create configuration
    /// let config = Config::new("app");
    /// assert_eq!(config.dev_addr, "127.0.0.1:3000");
    /// ```
    #[must_use]
    pub fn new<P>(app_root: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { app_root: app_root.into(), ..Self::default() }
    }

    /// Creates a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the document is malformed - this is
    /// surfaced to the caller verbatim, as a half-understood configuration
    /// is worse than none.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Into::into)
    }

    /// Returns the scratch directory of the server.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.app_root.join(".swite")
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Config {
    /// Creates the default configuration.
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("."),
            dev_addr: String::from("127.0.0.1:3000"),
            framework_dir: String::from("swiss-lib"),
            framework_scope: String::from("@swissjs"),
            extra_roots: Vec::new(),
            cache_capacity: 1000,
            debounce_ms: 100,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let config = Config::from_json(
            r#"{ "appRoot": "demo", "devAddr": "127.0.0.1:4000" }"#,
        )
        .unwrap();
        assert_eq!(config.app_root, PathBuf::from("demo"));
        assert_eq!(config.dev_addr, "127.0.0.1:4000");
        assert_eq!(config.cache_capacity, 1000);
    }

    #[test]
    fn test_from_json_invalid() {
        let res = Config::from_json("{ appRoot: }");
        assert!(matches!(res, Err(Error::Parse(_))));
    }
}
