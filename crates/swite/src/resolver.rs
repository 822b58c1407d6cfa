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

//! Module resolution.
//!
//! The resolver turns any import string - bare, scoped, relative, absolute,
//! or framework-prefixed - into a canonical browser URL. The loaded import
//! map answers the common bare specifiers in O(1); everything else probes
//! the file system across the workspace roots. Resolution never fails: a
//! specifier nothing on disk can answer falls back to a public CDN URL, so
//! the browser surfaces the problem instead of the server.

use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace, warn};

use super::urls;
use super::workspace::{Manifest, Registry, Workspace};

pub mod import_map;

pub use import_map::ImportMap;

/// Probed extensions, in priority order.
pub const EXTENSIONS: &[&str] =
    &["ui", "uix", "ts", "tsx", "js", "jsx", "mjs"];

/// Matches a valid package identifier with optional subpath.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[A-Za-z0-9_.-]+/)?[A-Za-z0-9_.-]+(?:/[A-Za-z0-9_./-]+)?$")
        .unwrap()
});

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Module specifier classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Specifier {
    /// Relative specifier, begins with `.`.
    Relative,
    /// Absolute URL, begins with `/`.
    Absolute,
    /// Bare specifier, begins with a letter.
    Bare,
    /// Scoped specifier, begins with `@`.
    Scoped,
    /// Framework-prefixed specifier, begins with the internal prefix.
    Framework,
    /// Anything else, including variable references - left alone.
    Invalid,
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Module resolver.
pub struct Resolver {
    /// Workspace roots.
    ws: Arc<Workspace>,
    /// Package registry.
    registry: Arc<Registry>,
    /// Pre-computed import map.
    import_map: ImportMap,
    /// Package scope of the framework.
    framework_scope: String,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Resolver {
    /// Creates a module resolver.
    #[must_use]
    pub fn new(
        ws: Arc<Workspace>, registry: Arc<Registry>, import_map: ImportMap,
        framework_scope: String,
    ) -> Self {
        Self { ws, registry, import_map, framework_scope }
    }

    /// Resolves a module specifier to a canonical browser URL.
    ///
    /// The importer is the absolute path of the source whose imports are
    /// being rewritten - relative specifiers are joined against its parent
    /// directory. Specifiers that are not actually module references, like
    /// variable names captured by an over-eager lexer, are returned
    /// unchanged.
    #[must_use]
    pub fn resolve(&self, specifier: &str, importer: &Path) -> String {
        let class = classify(specifier);

        // Fast path: the import map answers bare specifiers in O(1)
        if matches!(class, Specifier::Bare | Specifier::Scoped) {
            if let Some(url) = self.import_map.lookup(specifier) {
                trace!(specifier, url, "import map hit");
                return url.to_owned();
            }
        }

        match class {
            Specifier::Invalid => specifier.to_owned(),
            Specifier::Absolute => specifier.to_owned(),
            Specifier::Framework => self.resolve_framework(specifier),
            Specifier::Relative => self.resolve_relative(specifier, importer),
            Specifier::Bare | Specifier::Scoped => {
                self.resolve_bare(specifier)
            }
        }
    }

    /// Resolves a framework-prefixed specifier.
    ///
    /// The internal prefix addresses a file inside the framework checkout;
    /// mapping it through the canonicalizer applies both the public prefix
    /// and the source-over-built preference.
    fn resolve_framework(&self, specifier: &str) -> String {
        let rest = &specifier[urls::INTERNAL_PREFIX.len()..];
        if let Some(root) = &self.ws.framework_root {
            let path = root.join(rest);
            return urls::to_url(&path.to_string_lossy(), &self.ws);
        }
        urls::publish(specifier)
    }

    /// Resolves a relative specifier against the importer.
    ///
    /// The joined path is probed as-is, then with each extension in
    /// priority order, then as a directory with an index file. When all
    /// probes miss, the joined path is still mapped to a URL - the browser
    /// reporting a 404 beats silently swallowing the import.
    fn resolve_relative(&self, specifier: &str, importer: &Path) -> String {
        let base = importer.parent().unwrap_or_else(|| Path::new("."));
        let joined = lexical_normalize(&base.join(specifier));

        if joined.is_file() {
            return urls::to_url(&joined.to_string_lossy(), &self.ws);
        }
        if let Some(found) = probe(&joined) {
            return urls::to_url(&found.to_string_lossy(), &self.ws);
        }

        debug!(specifier, importer = %importer.display(), "relative miss");
        urls::to_url(&joined.to_string_lossy(), &self.ws)
    }

    /// Resolves a bare or scoped specifier.
    ///
    /// Probes `node_modules` at the application root, the workspace root,
    /// and the framework monorepo, then the framework's own packages, then
    /// the registry - with a single rescan when the first lookup misses.
    /// The CDN is the answer of last resort.
    fn resolve_bare(&self, specifier: &str) -> String {
        let (name, subpath) = split_specifier(specifier);

        // Probe node_modules across the workspace roots
        for root in self.ws.module_roots() {
            let dir = root.join("node_modules").join(name);
            if !dir.exists() {
                continue;
            }

            // Workspace packages are linked into node_modules - resolving
            // through the real path makes their sources servable, with
            // built paths rewritten to their source twins
            let real = fs::canonicalize(&dir).unwrap_or(dir);
            if let Some(path) = resolve_package(&real, subpath) {
                return urls::to_url(&path.to_string_lossy(), &self.ws);
            }
        }

        // Probe the framework's own packages for framework-scoped imports
        if let Some(rest) = name
            .strip_prefix(self.framework_scope.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        {
            if let Some(packages) = self.ws.framework_packages() {
                let dir = packages.join(rest);
                if let Some(path) = resolve_package(&dir, subpath) {
                    return urls::to_url(&path.to_string_lossy(), &self.ws);
                }
            }
        }

        // Probe the registry, rescanning once on a miss
        let package = self.registry.find(name).or_else(|| {
            debug!(name, "registry miss, rescanning");
            self.registry.rescan();
            self.registry.find(name)
        });
        if let Some(package) = package {
            if let Some(path) = resolve_package(&package.path, subpath) {
                return urls::to_url(&path.to_string_lossy(), &self.ws);
            }
        }

        // Nothing on disk answers this specifier
        warn!(specifier, "unresolved specifier, falling back to CDN");
        cdn_url(specifier)
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Classifies a module specifier.
///
/// # Examples
///
/// ```
/// use swite::resolver::{classify, Specifier};
///
/// // Classify specifiers
/// assert_eq!(classify("./App.uix"), Specifier::Relative);
/// assert_eq!(classify("@swissjs/core"), Specifier::Scoped);
/// assert_eq!(classify("def.componentUrl"), Specifier::Invalid);
/// ```
#[must_use]
pub fn classify(specifier: &str) -> Specifier {
    if specifier.is_empty() {
        return Specifier::Invalid;
    }
    if specifier.starts_with('.') {
        return Specifier::Relative;
    }
    if specifier
        .get(..urls::INTERNAL_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(urls::INTERNAL_PREFIX))
    {
        return Specifier::Framework;
    }
    if specifier.starts_with('/') {
        return Specifier::Absolute;
    }

    // Property-access syntax is a variable reference, not a specifier. The
    // naive exclusion would be "contains a dot and is not scoped", but that
    // misreads specifiers with extensions and dotted path segments - so a
    // dot only disqualifies single-segment specifiers without a recognized
    // extension, and the identifier grammar gets the final say.
    if !specifier.starts_with('@') {
        if specifier.contains('.')
            && !specifier.contains('/')
            && !has_recognized_extension(specifier)
        {
            return Specifier::Invalid;
        }
        if !specifier.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Specifier::Invalid;
        }
    }
    if !IDENTIFIER.is_match(specifier) {
        return Specifier::Invalid;
    }

    if specifier.starts_with('@') {
        Specifier::Scoped
    } else {
        Specifier::Bare
    }
}

/// Returns the CDN URL for an unresolvable specifier.
#[must_use]
pub fn cdn_url(specifier: &str) -> String {
    format!("https://cdn.jsdelivr.net/npm/{specifier}/+esm")
}

/// Splits a specifier into package name and subpath.
///
/// Scoped names span two segments, bare names one; whatever follows is the
/// subpath, possibly empty.
#[must_use]
pub fn split_specifier(specifier: &str) -> (&str, &str) {
    let segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut offset = 0;
    for _ in 0..segments {
        match specifier[offset..].find('/') {
            Some(found) => offset += found + 1,
            None => return (specifier, ""),
        }
    }
    (&specifier[..offset - 1], &specifier[offset..])
}

/// Resolves a subpath inside a package directory to a file.
///
/// The manifest's exports map is consulted first; its target is tried
/// verbatim, then with alternative extensions, then by a case-insensitive
/// scan for the basename. Without a usable export, the subpath itself is
/// probed, with `src/` as a fallback for the package root.
pub(crate) fn resolve_package(dir: &Path, subpath: &str) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    if let Some(manifest) = Manifest::load(dir) {
        if let Some(target) = manifest.resolve_export(subpath) {
            let candidate =
                lexical_normalize(&dir.join(target.trim_start_matches("./")));

            // Prefer the source tree over built artifacts
            let candidate =
                urls::source_twin(&candidate).unwrap_or(candidate);
            if candidate.is_file() {
                return Some(candidate);
            }
            if let Some(found) = probe(&candidate) {
                return Some(found);
            }
            if let Some(found) = scan_basename(&candidate) {
                return Some(found);
            }
        }
    }

    // No usable export - probe the subpath directly
    if subpath.is_empty() {
        probe(&dir.join("index")).or_else(|| probe(&dir.join("src/index")))
    } else {
        probe(&dir.join(subpath))
            .or_else(|| probe(&dir.join("src").join(subpath)))
    }
}

/// Probes a path with each extension, then as a directory with an index.
///
/// When several extensions exist for the same basename, the priority order
/// of [`EXTENSIONS`] decides - component sources always win over plain
/// script.
#[must_use]
pub fn probe(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    for ext in EXTENSIONS {
        // Replace a script extension, append to everything else, so both
        // `./x` and a compiler-mangled `./x.js` probe to `./x.ui`
        let candidate = match path.extension().and_then(|e| e.to_str()) {
            Some(existing) if EXTENSIONS.contains(&existing) => {
                path.with_extension(ext)
            }
            _ => append_extension(path, ext),
        };
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    for ext in EXTENSIONS {
        let candidate = path.join(format!("index.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Scans the parent directory for a case-insensitive basename match.
fn scan_basename(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    let name = path.file_name()?.to_str()?;
    fs::read_dir(parent)
        .ok()?
        .filter_map(Result::ok)
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|found| found.eq_ignore_ascii_case(name))
        })
        .map(|entry| entry.path())
}

/// Appends an extension to a path without replacing an existing one.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut text = path.as_os_str().to_os_string();
    text.push(".");
    text.push(ext);
    PathBuf::from(text)
}

/// Normalizes `.` and `..` components lexically.
///
/// Resolution must not canonicalize - symbolic links are meaningful here,
/// as workspace packages are reached through them - but relative imports
/// still need their parent references folded away.
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(parts.last(), Some(Component::Normal(_))) =>
            {
                parts.pop();
            }
            component => parts.push(component),
        }
    }
    parts.iter().collect()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    fn workspace(app: &Path) -> Arc<Workspace> {
        Arc::new(Workspace {
            app_root: app.to_path_buf(),
            workspace_root: None,
            framework_root: None,
        })
    }

    fn resolver(ws: Arc<Workspace>) -> Resolver {
        Resolver::new(
            ws,
            Arc::new(Registry::new()),
            ImportMap::empty(),
            String::from("@swissjs"),
        )
    }

    #[test]
    fn test_classify() {
        let test_cases = vec![
            ("./App.uix", Specifier::Relative),
            ("../util", Specifier::Relative),
            ("/src/index.ui", Specifier::Absolute),
            ("/swiss-lib/packages/core/src/a.ts", Specifier::Framework),
            ("/SWISS-LIB/packages/core/src/a.ts", Specifier::Framework),
            ("lodash", Specifier::Bare),
            ("lodash/fp.js", Specifier::Bare),
            ("@swissjs/core", Specifier::Scoped),
            ("@scope/pkg/a.b/c", Specifier::Scoped),
            ("def.componentUrl", Specifier::Invalid),
            ("window.location", Specifier::Invalid),
            ("", Specifier::Invalid),
            ("123abc", Specifier::Invalid),
        ];

        for (specifier, expected) in test_cases {
            assert_eq!(
                classify(specifier),
                expected,
                "Failed for: {specifier}"
            );
        }
    }

    #[test]
    fn test_split_specifier() {
        let test_cases = vec![
            ("lodash", ("lodash", "")),
            ("lodash/fp", ("lodash", "fp")),
            ("@swissjs/core", ("@swissjs/core", "")),
            ("@swissjs/core/utils", ("@swissjs/core", "utils")),
            ("@swissjs/core/a/b", ("@swissjs/core", "a/b")),
        ];

        for (specifier, expected) in test_cases {
            assert_eq!(
                split_specifier(specifier),
                expected,
                "Failed for: {specifier}"
            );
        }
    }

    #[test]
    fn test_extension_priority() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("x.ui"), "").unwrap();
        fs::write(src.join("x.ts"), "").unwrap();

        // Component source wins over plain script
        let ws = workspace(dir.path());
        let resolver = resolver(ws);
        let url = resolver.resolve("./x", &src.join("main.ui"));
        assert_eq!(url, "/src/x.ui");
    }

    #[test]
    fn test_resolve_relative_index() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src/widgets");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.ts"), "").unwrap();

        let ws = workspace(dir.path());
        let resolver = resolver(ws);
        let url =
            resolver.resolve("./widgets", &dir.path().join("src/main.ui"));
        assert_eq!(url, "/src/widgets/index.ts");
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let resolver = resolver(ws);

        let url = resolver.resolve("/src/App.uix", Path::new("/x/main.ui"));
        assert_eq!(url, "/src/App.uix");
    }

    #[test]
    fn test_resolve_variable_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let resolver = resolver(ws);

        let url =
            resolver.resolve("def.componentUrl", Path::new("/x/main.ui"));
        assert_eq!(url, "def.componentUrl");
    }

    #[test]
    fn test_resolve_bare_cdn_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let resolver = resolver(ws);

        let url = resolver.resolve("left-pad", Path::new("/x/main.ui"));
        assert_eq!(url, "https://cdn.jsdelivr.net/npm/left-pad/+esm");
    }

    #[test]
    fn test_resolve_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/demo");
        fs::create_dir_all(pkg.join("src")).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{ "name": "demo", "exports": { ".": "./src/index.ts" } }"#,
        )
        .unwrap();
        fs::write(pkg.join("src/index.ts"), "").unwrap();

        let ws = workspace(dir.path());
        let resolver = resolver(ws);
        let url = resolver.resolve("demo", &dir.path().join("src/main.ui"));
        assert_eq!(url, "/node_modules/demo/src/index.ts");
    }

    #[test]
    fn test_resolve_framework_scope() {
        let dir = tempfile::tempdir().unwrap();
        let fw = dir.path().join("swiss-lib");
        let core = fw.join("packages/core");
        fs::create_dir_all(core.join("src")).unwrap();
        fs::write(
            core.join("package.json"),
            r#"{ "name": "@swissjs/core", "exports": { ".": "./dist/index.js" } }"#,
        )
        .unwrap();
        fs::write(core.join("src/index.ts"), "").unwrap();

        let ws = Arc::new(Workspace {
            app_root: dir.path().join("app"),
            workspace_root: None,
            framework_root: Some(fw),
        });
        let resolver = resolver(ws);

        // The built export target is swapped for its source twin
        let url =
            resolver.resolve("@swissjs/core", Path::new("/x/main.ui"));
        assert_eq!(url, "/swiss-packages/core/src/index.ts");
    }

    #[test]
    fn test_resolve_import_map_fast_path() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let map = ImportMap::from_iter([(
            String::from("@swissjs/core"),
            String::from("/swiss-packages/core/src/index.ts"),
        )]);
        let resolver = Resolver::new(
            ws,
            Arc::new(Registry::new()),
            map,
            String::from("@swissjs"),
        );

        let url =
            resolver.resolve("@swissjs/core", Path::new("/x/main.ui"));
        assert_eq!(url, "/swiss-packages/core/src/index.ts");
    }

    #[test]
    fn test_lexical_normalize() {
        let test_cases = vec![
            ("/a/b/./c", "/a/b/c"),
            ("/a/b/../c", "/a/c"),
            ("/a/b/../../c", "/c"),
        ];

        for (input, expected) in test_cases {
            assert_eq!(
                lexical_normalize(Path::new(input)),
                PathBuf::from(expected),
                "Failed for: {input}"
            );
        }
    }
}
