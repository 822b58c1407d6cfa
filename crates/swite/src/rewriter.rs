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

//! Import rewriting.
//!
//! Given script text and the path of its source, the rewriter replaces
//! every static module specifier with an absolute URL or CDN URL a browser
//! can fetch. Dynamic imports are rewritten only when their argument is a
//! string literal at the reported position; anything else is a variable
//! reference and stays textually identical.
//!
//! The lexer-driven pass does the bulk of the work, but it is followed by
//! three textual backstops - a relative-`.js` repair, an internal-prefix
//! sweep and a bare-scoped-specifier sweep. Each backstop exists because a
//! different layer has been observed to leak its pattern under a corner
//! case; collapsing them into one pass has regressed before.

use regex::{Captures, Regex};
use std::path::{Component, Path};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::resolver::{cdn_url, lexical_normalize, Resolver};
use super::urls;
use super::workspace::Workspace;

/// Source extensions the compiler may have mangled into `.js`.
const REPAIR_EXTENSIONS: &[&str] = &["ui", "uix", "ts", "tsx"];

/// Matches a relative `.js` specifier in import position.
static RELATIVE_JS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(\bfrom\s*|\bimport\s*\(\s*|\bimport\s+)(["'])(\.\.?/[^"']+\.js)(["'])"#,
    )
    .unwrap()
});

/// Matches a bare scoped specifier in import position.
static BARE_SCOPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(\bfrom\s*|\bimport\s*\(\s*|\bimport\s+)(["'])(@[A-Za-z0-9_.-]+/[A-Za-z0-9_./-]+)(["'])"#,
    )
    .unwrap()
});

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Static import found by the lexer.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Import {
    /// Byte offset of the specifier, excluding quotes.
    start: usize,
    /// Byte offset one past the specifier, excluding quotes.
    end: usize,
    /// Specifier text.
    specifier: String,
}

// ----------------------------------------------------------------------------

/// Import rewriter.
pub struct Rewriter {
    /// Module resolver.
    resolver: Arc<Resolver>,
    /// Workspace roots.
    ws: Arc<Workspace>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Rewriter {
    /// Creates an import rewriter.
    #[must_use]
    pub fn new(resolver: Arc<Resolver>, ws: Arc<Workspace>) -> Self {
        Self { resolver, ws }
    }

    /// Rewrites every static module specifier in the given script.
    ///
    /// Rewriting is idempotent: specifiers that are already absolute or
    /// CDN URLs pass through unchanged, so running the rewriter over its
    /// own output is a no-op.
    #[must_use]
    pub fn rewrite(&self, source: &str, importer: &Path) -> String {
        let mut out = String::with_capacity(source.len());
        let mut last = 0;

        // Lexer-driven pass: substitute each discovered specifier, keeping
        // the surrounding text - including the quotes - byte-identical
        for import in scan(source) {
            out.push_str(&source[last..import.start]);
            out.push_str(&self.substitute(&import.specifier, importer));
            last = import.end;
        }
        out.push_str(&source[last..]);

        // Backstop 1: relative `.js` specifiers that survived the lexer
        let out = RELATIVE_JS.replace_all(&out, |caps: &Captures| {
            let specifier = &caps[3];
            let repaired = self
                .repair_extension(specifier, importer)
                .unwrap_or_else(|| specifier.to_owned());
            format!(
                "{}{}{}{}",
                &caps[1],
                &caps[2],
                self.resolver.resolve(&repaired, importer),
                &caps[4],
            )
        });

        // Backstop 2: the internal prefix must never survive, anywhere
        let out = urls::publish(&out);

        // Backstop 3: remaining bare scoped specifiers go to the CDN
        let out = BARE_SCOPED.replace_all(&out, |caps: &Captures| {
            debug!(specifier = &caps[3], "forcing CDN substitution");
            format!("{}{}{}{}", &caps[1], &caps[2], cdn_url(&caps[3]), &caps[4])
        });

        out.into_owned()
    }

    /// Substitutes a single specifier.
    fn substitute(&self, specifier: &str, importer: &Path) -> String {
        // Stylesheet imports are stripped by the pipeline before rewriting;
        // whatever still mentions a stylesheet is not ours to touch
        if specifier.contains(".css") {
            return specifier.to_owned();
        }

        // Undo the compiler's `.js` extension mangling before resolution
        let repaired = self.repair_extension(specifier, importer);
        let specifier = repaired.as_deref().unwrap_or(specifier);
        self.resolver.resolve(specifier, importer)
    }

    /// Repairs a relative `.js` specifier whose file does not exist.
    ///
    /// The compiler emits `.js` for relative imports of source files; this
    /// picks the replacement extension from the importer's location, then
    /// verifies against the file system, falling back through the source
    /// extensions when the preferred one misses.
    fn repair_extension(
        &self, specifier: &str, importer: &Path,
    ) -> Option<String> {
        if !specifier.starts_with('.') || !specifier.ends_with(".js") {
            return None;
        }

        // An existing file needs no repair
        let base = importer.parent()?;
        let joined = lexical_normalize(&base.join(specifier));
        if joined.is_file() {
            return None;
        }

        // Pick the replacement extension from the importer's location
        let preferred = self.preferred_extension(importer);
        let stem = joined.with_extension("");
        let chosen = if stem.with_extension(preferred).is_file() {
            preferred
        } else {
            REPAIR_EXTENSIONS
                .iter()
                .copied()
                .find(|ext| stem.with_extension(ext).is_file())
                .unwrap_or(preferred)
        };

        let repaired = format!(
            "{}.{chosen}",
            specifier.strip_suffix(".js").expect("suffix checked")
        );
        debug!(specifier, repaired, "repaired relative extension");
        Some(repaired)
    }

    /// Returns the preferred repair extension for the given importer.
    ///
    /// Framework packages and workspace libraries are TypeScript trees;
    /// component sources import their siblings, so the importer's own
    /// extension wins there.
    fn preferred_extension(&self, importer: &Path) -> &'static str {
        if let Some(packages) = self.ws.framework_packages() {
            if importer.starts_with(&packages) {
                return "ts";
            }
        }
        if importer
            .components()
            .any(|component| component == Component::Normal("lib".as_ref()))
        {
            return "ts";
        }
        match importer.extension().and_then(|ext| ext.to_str()) {
            Some("ui") => "ui",
            Some("uix") => "uix",
            _ => "ts",
        }
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Returns every static import specifier in the given script.
pub(crate) fn specifiers(source: &str) -> Vec<String> {
    scan(source)
        .into_iter()
        .map(|import| import.specifier)
        .collect()
}

/// Scans script text for static import specifiers.
///
/// A hand-rolled lexer is enough here: it tracks comments, strings and
/// template literals so keywords inside them are not mistaken for syntax,
/// and recognizes the three shapes that carry a specifier - `import ...
/// from "x"`, side-effect `import "x"`, `export ... from "x"`, and dynamic
/// `import("x")` with a literal argument.
fn scan(source: &str) -> Vec<Import> {
    let bytes = source.as_bytes();
    let mut imports = Vec::new();
    let mut n = 0;

    while n < bytes.len() {
        match bytes[n] {
            // Line comment
            b'/' if bytes.get(n + 1) == Some(&b'/') => {
                n = memchr(bytes, n, b'\n').unwrap_or(bytes.len());
            }

            // Block comment
            b'/' if bytes.get(n + 1) == Some(&b'*') => {
                n = find(source, n + 2, "*/")
                    .map_or(bytes.len(), |found| found + 2);
            }

            // String or template literal outside of import position
            b'"' | b'\'' | b'`' => {
                n = skip_string(bytes, n);
            }

            // Keyword candidate
            b'i' | b'e' => {
                let (keyword, is_import) = if source[n..].starts_with("import")
                {
                    (n + "import".len(), true)
                } else if source[n..].starts_with("export") {
                    (n + "export".len(), false)
                } else {
                    n += 1;
                    continue;
                };

                // Reject keywords inside identifiers
                let boundary = (n == 0 || !is_identifier(bytes[n - 1]))
                    && bytes
                        .get(keyword)
                        .is_none_or(|byte| !is_identifier(*byte));
                if !boundary {
                    n = keyword;
                    continue;
                }

                match specifier_after(source, keyword, is_import) {
                    Some(import) => {
                        n = import.end + 1;
                        imports.push(import);
                    }
                    None => n = keyword,
                }
            }

            _ => n += 1,
        }
    }
    imports
}

/// Extracts the specifier following an import or export keyword.
///
/// Walks over the clause - bindings, braces, the `from` keyword - until a
/// quote is reached, and only accepts the string when the clause shape
/// actually permits a specifier at that point. Dynamic imports require a
/// string literal as the immediate argument; `import(someVar)` is left for
/// the runtime to resolve.
fn specifier_after(
    source: &str, mut n: usize, is_import: bool,
) -> Option<Import> {
    let bytes = source.as_bytes();
    while n < bytes.len() && bytes[n].is_ascii_whitespace() {
        n += 1;
    }

    // Dynamic import: accept only a direct string literal argument
    if is_import && bytes.get(n) == Some(&b'(') {
        n += 1;
        while n < bytes.len() && bytes[n].is_ascii_whitespace() {
            n += 1;
        }
        return match bytes.get(n) {
            Some(b'"' | b'\'') => read_string(source, n),
            _ => None,
        };
    }

    // Static import or re-export: walk the clause up to the specifier
    let mut clause = String::new();
    while n < bytes.len() {
        let byte = bytes[n];
        match byte {
            b'"' | b'\'' => {
                // A string is only a specifier directly after the keyword
                // (side-effect import) or after a `from`
                let trimmed = clause.trim();
                let accepts = (is_import && trimmed.is_empty())
                    || trimmed.ends_with("from");
                return accepts.then(|| read_string(source, n)).flatten();
            }
            byte if is_identifier(byte)
                || byte.is_ascii_whitespace()
                || matches!(byte, b'{' | b'}' | b',' | b'*') =>
            {
                clause.push(byte as char);
                n += 1;
            }
            _ => return None,
        }
    }
    None
}

/// Reads a string literal starting at the given quote.
fn read_string(source: &str, n: usize) -> Option<Import> {
    let bytes = source.as_bytes();
    let quote = bytes[n];
    let start = n + 1;
    let mut end = start;

    while end < bytes.len() {
        match bytes[end] {
            b'\\' => end += 2,
            byte if byte == quote => {
                return Some(Import {
                    start,
                    end,
                    specifier: source[start..end].to_owned(),
                });
            }
            _ => end += 1,
        }
    }
    None
}

/// Skips a string or template literal, returning the index after it.
fn skip_string(bytes: &[u8], n: usize) -> usize {
    let quote = bytes[n];
    let mut end = n + 1;
    while end < bytes.len() {
        match bytes[end] {
            b'\\' => end += 2,
            byte if byte == quote => return end + 1,
            _ => end += 1,
        }
    }
    bytes.len()
}

/// Checks whether a byte may be part of an identifier.
fn is_identifier(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Finds the next occurrence of a byte at or after the given offset.
fn memchr(bytes: &[u8], n: usize, needle: u8) -> Option<usize> {
    bytes[n..].iter().position(|byte| *byte == needle).map(|p| n + p)
}

/// Finds the next occurrence of a pattern at or after the given offset.
fn find(source: &str, n: usize, pattern: &str) -> Option<usize> {
    source[n..].find(pattern).map(|found| n + found)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ImportMap;
    use crate::workspace::Registry;
    use std::fs;

    fn scan_specifiers(source: &str) -> Vec<String> {
        scan(source)
            .into_iter()
            .map(|import| import.specifier)
            .collect()
    }

    #[test]
    fn test_scan() {
        let test_cases: Vec<(&str, Vec<&str>)> = vec![
            (r#"import { A } from './a';"#, vec!["./a"]),
            (r#"import './side-effect';"#, vec!["./side-effect"]),
            (r#"import * as ns from "@scope/pkg";"#, vec!["@scope/pkg"]),
            (r#"export { B } from './b';"#, vec!["./b"]),
            (r#"export * from './c';"#, vec!["./c"]),
            (r#"import('./lazy')"#, vec!["./lazy"]),
            (r#"import(someVar)"#, vec![]),
            (r#"export const x = "not a specifier";"#, vec![]),
            (r#"// import { A } from './a';"#, vec![]),
            (r#"/* import { A } from './a'; */"#, vec![]),
            (r#"const s = "import { A } from './a';";"#, vec![]),
            (
                "import { A } from './a';\nimport B from \"./b\";",
                vec!["./a", "./b"],
            ),
            (
                "import {\n  A,\n  B,\n} from './multi';",
                vec!["./multi"],
            ),
        ];

        for (source, expected) in test_cases {
            assert_eq!(
                scan_specifiers(source),
                expected,
                "Failed for: {source}"
            );
        }
    }

    fn rewriter(app: &Path) -> Rewriter {
        let ws = Arc::new(Workspace {
            app_root: app.to_path_buf(),
            workspace_root: None,
            framework_root: None,
        });
        let resolver = Arc::new(Resolver::new(
            ws.clone(),
            Arc::new(Registry::new()),
            ImportMap::empty(),
            String::from("@swissjs"),
        ));
        Rewriter::new(resolver, ws)
    }

    #[test]
    fn test_rewrite_relative() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("App.uix"), "").unwrap();

        let rewriter = rewriter(dir.path());
        let out = rewriter.rewrite(
            "import { App } from './App.uix';",
            &src.join("index.ui"),
        );
        assert_eq!(out, "import { App } from '/src/App.uix';");
    }

    #[test]
    fn test_rewrite_preserves_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.ts"), "").unwrap();

        let rewriter = rewriter(dir.path());
        let out =
            rewriter.rewrite("import A from './a';", &src.join("index.ui"));
        assert_eq!(out, "import A from '/src/a.ts';");
    }

    #[test]
    fn test_rewrite_extension_repair() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Button.uix"), "").unwrap();

        // The compiler mangled `./Button.uix` into `./Button.js`
        let rewriter = rewriter(dir.path());
        let out = rewriter.rewrite(
            "import { Button } from './Button.js';",
            &src.join("index.uix"),
        );
        assert_eq!(out, "import { Button } from '/src/Button.uix';");
    }

    #[test]
    fn test_rewrite_css_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let rewriter = rewriter(dir.path());

        let source = "import './styles.css';";
        let out = rewriter.rewrite(source, &dir.path().join("src/a.ui"));
        assert_eq!(out, source);
    }

    #[test]
    fn test_rewrite_dynamic_variable_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let rewriter = rewriter(dir.path());

        let source = "const mod = await import(def.componentUrl);";
        let out = rewriter.rewrite(source, &dir.path().join("src/a.ui"));
        assert_eq!(out, source);
    }

    #[test]
    fn test_rewrite_prefix_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let rewriter = rewriter(dir.path());

        let out = rewriter.rewrite(
            r#"import X from '/swiss-lib/packages/core/src/index.ts';"#,
            &dir.path().join("src/a.ui"),
        );
        assert!(!out.contains("/swiss-lib/"));
        assert!(out.contains("/swiss-packages/core/src/index.ts"));
    }

    #[test]
    fn test_rewrite_scoped_cdn_backstop() {
        let dir = tempfile::tempdir().unwrap();
        let rewriter = rewriter(dir.path());

        let out = rewriter.rewrite(
            r#"import { x } from "@unknown/pkg";"#,
            &dir.path().join("src/a.ui"),
        );
        assert_eq!(
            out,
            r#"import { x } from "https://cdn.jsdelivr.net/npm/@unknown/pkg/+esm";"#
        );
    }

    #[test]
    fn test_rewrite_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("App.uix"), "").unwrap();

        let rewriter = rewriter(dir.path());
        let source = concat!(
            "import { App } from './App.uix';\n",
            "import { x } from \"@unknown/pkg\";\n",
            "const mod = await import(def.componentUrl);\n",
        );
        let importer = src.join("index.ui");

        let once = rewriter.rewrite(source, &importer);
        let twice = rewriter.rewrite(&once, &importer);
        assert_eq!(once, twice);
    }
}
