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

//! Stylesheet import stripping.
//!
//! Component sources import their stylesheets for bundling, but in
//! development stylesheets are served as plain files and injected by the
//! client - a browser asked to execute `import './x.css'` would choke.
//! Four passes remove them from compiled output: line-anchored, word-bound,
//! dynamic, and a generic sweep. The compiler has been observed to emit
//! stylesheet imports in each of these shapes; a single pattern does not
//! catch them all.

use regex::Regex;
use std::sync::LazyLock;

/// Line-anchored stylesheet import.
static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[^\S\n]*import\s+["'][^"'\n]*\.css["'];?[^\S\n]*\n?"#)
        .unwrap()
});

/// Word-bound stylesheet import.
static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+["'][^"']*\.css["'];?"#).unwrap()
});

/// Dynamic stylesheet import.
static DYNAMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:await\s+)?import\(\s*["'][^"']*\.css["']\s*\);?"#)
        .unwrap()
});

/// Generic stylesheet import, including default bindings.
static GENERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"import[^'";\n]*["'][^"']*\.css["']\s*;?"#).unwrap()
});

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Removes every stylesheet import from the given script.
#[must_use]
pub fn strip(source: &str) -> String {
    let source = LINE.replace_all(source, "");
    let source = WORD.replace_all(&source, "");
    let source = DYNAMIC.replace_all(&source, "");
    let source = GENERIC.replace_all(&source, "");
    source.into_owned()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip() {
        let test_cases = vec![
            // Line-anchored
            ("import './a.css';\nconst x = 1;", "const x = 1;"),
            // Word-bound, mid-line
            ("const x = 1; import \"./b.css\";", "const x = 1; "),
            // Dynamic
            ("await import('./c.css');", ""),
            // Default binding
            ("import styles from './d.css';\nrun();", "\nrun();"),
            // Script imports survive
            (
                "import { A } from './a.uix';\nconst x = 1;",
                "import { A } from './a.uix';\nconst x = 1;",
            ),
        ];

        for (source, expected) in test_cases {
            assert_eq!(strip(source), expected, "Failed for: {source}");
        }
    }

    #[test]
    fn test_strip_mixed() {
        let source = concat!(
            "import './theme.css';\n",
            "import { App } from './App.uix';\n",
            "import styles from './app.css';\n",
        );
        let stripped = strip(source);
        assert!(!stripped.contains(".css"));
        assert!(stripped.contains("./App.uix"));
    }
}
