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

//! HTTP request URI.

use percent_encoding::percent_decode_str;
use std::fmt;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP request URI.
///
/// This is a lightweight, deliberately not spec-compliant URI parser. The
/// sane thing would be to use the [`url`][] crate, but it pulls in a large
/// dependency tree for a local development server that only ever sees
/// origin-form request targets starting with a `/`.
///
/// [`url`]: https://crates.io/crates/url
///
/// The path is percent-decoded; the query string is kept verbatim and only
/// split into pairs on demand, as almost no request carries one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Uri {
    /// Request path, percent-decoded.
    pub path: String,
    /// Query string, verbatim.
    pub query: Option<String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Uri {
    /// Creates a request URI.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of the given query parameter, if present.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::http::Uri;
    ///
    /// // Create request URI and read parameter
    /// let uri = Uri::from("/__swite_diagnose?url=/src/index.ui");
    /// assert_eq!(uri.param("url"), Some("/src/index.ui".into()));
    /// ```
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name)
                .then(|| percent_decode_str(value).decode_utf8_lossy())
                .map(Into::into)
        })
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl From<&str> for Uri {
    /// Creates a request URI from a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::http::Uri;
    ///
    /// // Create request URI from string
    /// let uri = Uri::from("/src/App.uix?v=2");
    /// assert_eq!(uri.path, "/src/App.uix");
    /// ```
    fn from(value: &str) -> Self {
        let (path, query) = match value.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (value, None),
        };
        Uri {
            path: percent_decode_str(path).decode_utf8_lossy().into_owned(),
            query,
        }
    }
}

impl fmt::Display for Uri {
    /// Formats the URI for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let test_cases = vec![
            ("/", "/", None),
            ("/src/index.ui", "/src/index.ui", None),
            ("/a%20b.ts", "/a b.ts", None),
            ("/x?y=z", "/x", Some("y=z")),
        ];

        for (input, path, query) in test_cases {
            let uri = Uri::from(input);
            assert_eq!(uri.path, path, "Failed for: {input}");
            assert_eq!(uri.query.as_deref(), query, "Failed for: {input}");
        }
    }

    #[test]
    fn test_param() {
        let uri = Uri::from("/__swite_diagnose?url=%2Fsrc%2Findex.ui&x=1");
        assert_eq!(uri.param("url"), Some("/src/index.ui".into()));
        assert_eq!(uri.param("x"), Some("1".into()));
        assert_eq!(uri.param("y"), None);
    }
}
