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

//! URL canonicalization.
//!
//! Bidirectional mapping between absolute file system paths and the URLs a
//! browser sees, enforcing three rules:
//!
//! 1. **Source over built.** In development, a path below a `dist`
//!    directory is answered from its `src` twin when one exists, so the
//!    browser always loads the file the developer is editing.
//! 2. **Never leak the internal prefix.** The framework monorepo lives in
//!    a directory whose name must never appear in a browser - its public
//!    face is the `/swiss-packages/` URL prefix. The substitution runs at
//!    every return point; history shows each layer can leak it under a
//!    different corner case, so the redundancy stays.
//! 3. **Preserve case below `node_modules`.** Installed packages ship
//!    files whose exact case matters to the browser but not to every file
//!    system, so emitted URLs restore the on-disk case of every segment.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

use super::workspace::Workspace;

/// Characters escaped in emitted URLs.
///
/// Emitted URLs end up inside quoted import specifiers, so quotes and
/// backticks must never appear verbatim.
const ESCAPED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'`')
    .add(b'<')
    .add(b'>');

/// Internal on-disk prefix of the framework monorepo.
pub const INTERNAL_PREFIX: &str = "/swiss-lib/";

/// Public URL prefix of the framework monorepo.
pub const PUBLIC_PREFIX: &str = "/swiss-packages/";

/// Matches the internal prefix, case-insensitively.
///
/// The public prefix already addresses the monorepo's `packages` directory,
/// so a `packages/` segment following the internal prefix folds into it.
static INTERNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/swiss-lib/(?:packages/)?").unwrap());

/// Built-tree to source-tree extension remap.
const SOURCE_REMAP: &[(&str, &str)] =
    &[("js", "ts"), ("jsx", "tsx"), ("mjs", "ts")];

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Replaces every occurrence of the internal prefix with the public one.
///
/// # Examples
///
/// ```
/// use swite::urls::publish;
///
/// // Convert internal prefix
/// let url = publish("/swiss-lib/packages/core/src/index.ts");
/// assert_eq!(url, "/swiss-packages/core/src/index.ts");
/// ```
#[must_use]
pub fn publish(text: &str) -> String {
    INTERNAL.replace_all(text, PUBLIC_PREFIX).into_owned()
}

/// Checks whether the given string is already a browser URL.
#[must_use]
pub fn is_url(text: &str) -> bool {
    text.starts_with("http://")
        || text.starts_with("https://")
        || [
            "/src/",
            "/public/",
            "/assets/",
            "/node_modules/",
            PUBLIC_PREFIX,
            INTERNAL_PREFIX,
            "/lib/",
            "/libraries/",
            "/packages/",
            "/modules/",
        ]
        .iter()
        .any(|prefix| {
            text.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
}

/// Returns the source-tree twin of a built path, when it exists.
///
/// The last `dist` component is replaced by `src`, and the built extension
/// remapped to its source counterpart. Only an existing twin counts.
#[must_use]
pub fn source_twin(path: &Path) -> Option<PathBuf> {
    let index = path
        .components()
        .enumerate()
        .filter(|(_, component)| component.as_os_str() == "dist")
        .map(|(index, _)| index)
        .last()?;

    // Rebuild the path with `src` substituted for `dist`
    let mut twin: PathBuf = path
        .components()
        .enumerate()
        .map(|(n, component)| {
            if n == index {
                Component::Normal("src".as_ref())
            } else {
                component
            }
        })
        .collect();

    // Remap the built extension to its source counterpart
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        if let Some((_, source)) =
            SOURCE_REMAP.iter().find(|(built, _)| *built == ext)
        {
            twin.set_extension(source);
        }
    }
    twin.is_file().then_some(twin)
}

/// Maps an absolute file system path to its canonical browser URL.
///
/// Strings that already are URLs only have the internal prefix converted.
/// Everything else is located relative to the workspace roots, in order:
/// framework packages, `node_modules`, application root, workspace root.
/// Paths outside all roots produce a warning and a best-effort URL.
#[must_use]
pub fn to_url(path: &str, ws: &Workspace) -> String {
    if is_url(path) {
        return publish(path);
    }
    let path = Path::new(path);

    // Framework packages are served under the public prefix
    if let Some(packages) = ws.framework_packages() {
        if let Ok(rel) = path.strip_prefix(&packages) {
            let preferred = source_twin(path);
            let rel = preferred
                .as_ref()
                .and_then(|twin| twin.strip_prefix(&packages).ok())
                .unwrap_or(rel);
            return publish(&format!("{PUBLIC_PREFIX}{}", slashes(rel)));
        }
    }

    // Installed packages keep their on-disk case
    let lossy = path.to_string_lossy();
    if let Some(offset) = lossy.rfind("/node_modules/") {
        let base = Path::new(&lossy[..offset]).join("node_modules");
        let rel = PathBuf::from(&lossy[offset + "/node_modules/".len()..]);
        let rel = on_disk_case(&base, &rel).unwrap_or(rel);
        return publish(&format!("/node_modules/{}", slashes(&rel)));
    }

    // Application and workspace files are root-relative
    if let Ok(rel) = path.strip_prefix(&ws.app_root) {
        return publish(&format!("/{}", slashes(rel)));
    }
    if let Some(root) = &ws.workspace_root {
        if let Ok(rel) = path.strip_prefix(root) {
            let preferred = (!path.exists())
                .then(|| source_twin(path))
                .flatten();
            let rel = preferred
                .as_ref()
                .and_then(|twin| twin.strip_prefix(root).ok())
                .unwrap_or(rel);
            return publish(&format!("/{}", slashes(rel)));
        }
    }

    // The path lies outside every known root, which is almost certainly a
    // resolution bug - emit a best-effort URL so the error surfaces in the
    // browser's network tab instead of vanishing
    warn!(path = %path.display(), "path outside all workspace roots");
    publish(&format!("/{}", slashes(path).trim_start_matches('/')))
}

/// Maps a browser URL back to the file system path it addresses.
///
/// This is the inverse of [`to_url`], dispatching on the URL prefix. The
/// returned path is not guaranteed to exist - the pipeline probes sibling
/// extensions on top of it - but `None` means the URL cannot be mapped at
/// all, e.g. a framework URL without a framework checkout.
#[must_use]
pub fn resolve_file_path(url: &str, ws: &Workspace) -> Option<PathBuf> {
    let url = publish(url);
    let url = url.split(['?', '#']).next().unwrap_or(&url);
    let rel = url.trim_start_matches('/');

    // Application source and static trees
    for prefix in ["/src/", "/public/", "/assets/"] {
        if url.starts_with(prefix) {
            return Some(ws.app_root.join(rel));
        }
    }

    // Installed packages, application root first
    if url.starts_with("/node_modules/") {
        let primary = ws.app_root.join(rel);
        if primary.exists() {
            return Some(primary);
        }
        if let Some(root) = &ws.workspace_root {
            let secondary = root.join(rel);
            if secondary.exists() {
                return Some(secondary);
            }
        }
        return Some(primary);
    }

    // Framework packages
    if let Some(rest) = url.strip_prefix(PUBLIC_PREFIX) {
        return ws.framework_packages().map(|packages| packages.join(rest));
    }

    // Workspace package trees
    for prefix in ["/lib/", "/libraries/", "/packages/", "/modules/"] {
        if url.starts_with(prefix) {
            let root = ws.workspace_root.as_ref().unwrap_or(&ws.app_root);
            return Some(root.join(rel));
        }
    }

    // Everything else: workspace root, then application root
    if let Some(root) = &ws.workspace_root {
        let candidate = root.join(rel);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    let candidate = ws.app_root.join(rel);
    candidate.exists().then_some(candidate)
}

/// Restores the on-disk case of a relative path below a base directory.
///
/// Each segment is matched case-insensitively against the directory
/// listing; segments that match exactly are kept as given. Returns `None`
/// when a segment has no case-insensitive counterpart on disk.
#[must_use]
pub fn on_disk_case(base: &Path, rel: &Path) -> Option<PathBuf> {
    let mut current = base.to_path_buf();
    let mut cased = PathBuf::new();

    for component in rel.components() {
        let name = component.as_os_str().to_str()?;

        // Always consult the directory listing - on case-insensitive file
        // systems a plain existence check would confirm the wrong case
        let names: Vec<String> = fs::read_dir(&current)
            .ok()?
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        let found = names
            .iter()
            .find(|found| *found == name)
            .or_else(|| {
                names.iter().find(|found| found.eq_ignore_ascii_case(name))
            })?
            .clone();
        cased.push(&found);
        current.push(&found);
    }
    Some(cased)
}

/// Converts a path to a forward-slashed, URL-safe string.
fn slashes(path: &Path) -> String {
    let lossy = path.to_string_lossy();
    let text = if cfg!(windows) {
        lossy.replace('\\', "/")
    } else {
        lossy.into_owned()
    };
    utf8_percent_encode(&text, ESCAPED).to_string()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workspace(app: &Path) -> Workspace {
        Workspace {
            app_root: app.to_path_buf(),
            workspace_root: None,
            framework_root: None,
        }
    }

    #[test]
    fn test_publish() {
        let test_cases = vec![
            ("/swiss-lib/core/index.ts", "/swiss-packages/core/index.ts"),
            ("/Swiss-Lib/core/index.ts", "/swiss-packages/core/index.ts"),
            (
                "/swiss-lib/packages/core/index.ts",
                "/swiss-packages/core/index.ts",
            ),
            ("/swiss-packages/core/index.ts", "/swiss-packages/core/index.ts"),
            ("import x from '/swiss-lib/a'", "import x from '/swiss-packages/a'"),
        ];

        for (input, expected) in test_cases {
            assert_eq!(publish(input), expected, "Failed for: {input}");
        }
    }

    #[test]
    fn test_source_twin() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("core");
        fs::create_dir_all(pkg.join("dist")).unwrap();
        fs::create_dir_all(pkg.join("src")).unwrap();
        fs::write(pkg.join("src/index.ts"), "").unwrap();

        // Twin exists, so the built path is remapped
        let built = pkg.join("dist/index.js");
        assert_eq!(source_twin(&built), Some(pkg.join("src/index.ts")));

        // No twin on disk, no remap
        let built = pkg.join("dist/other.js");
        assert_eq!(source_twin(&built), None);
    }

    #[test]
    fn test_to_url_app_root() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());

        let path = dir.path().join("src/App.uix");
        let url = to_url(&path.to_string_lossy(), &ws);
        assert_eq!(url, "/src/App.uix");
    }

    #[test]
    fn test_to_url_framework() {
        let dir = tempfile::tempdir().unwrap();
        let fw = dir.path().join("swiss-lib");
        let pkg = fw.join("packages/core");
        fs::create_dir_all(pkg.join("dist")).unwrap();
        fs::create_dir_all(pkg.join("src")).unwrap();
        fs::write(pkg.join("src/index.ts"), "").unwrap();

        let ws = Workspace {
            app_root: dir.path().join("app"),
            workspace_root: None,
            framework_root: Some(fw),
        };

        // Built framework path maps to public prefix and source tree
        let built = pkg.join("dist/index.js");
        let url = to_url(&built.to_string_lossy(), &ws);
        assert_eq!(url, "/swiss-packages/core/src/index.ts");
    }

    #[test]
    fn test_to_url_node_modules_case() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/reflect-metadata");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("Reflect.js"), "").unwrap();

        let ws = workspace(dir.path());
        let requested = pkg.join("reflect.js");
        let url = to_url(&requested.to_string_lossy(), &ws);
        assert_eq!(url, "/node_modules/reflect-metadata/Reflect.js");
    }

    #[test]
    fn test_to_url_already_url() {
        let ws = workspace(Path::new("/nonexistent"));
        assert_eq!(
            to_url("/swiss-lib/core/src/index.ts", &ws),
            "/swiss-packages/core/src/index.ts"
        );
        assert_eq!(
            to_url("https://cdn.jsdelivr.net/npm/x/+esm", &ws),
            "https://cdn.jsdelivr.net/npm/x/+esm"
        );
    }

    #[test]
    fn test_resolve_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());

        // Application prefixes resolve below the application root
        assert_eq!(
            resolve_file_path("/src/index.ui", &ws),
            Some(dir.path().join("src/index.ui"))
        );
        assert_eq!(
            resolve_file_path("/assets/logo.svg", &ws),
            Some(dir.path().join("assets/logo.svg"))
        );

        // Unknown URLs resolve only when a file exists
        assert_eq!(resolve_file_path("/unknown/file.ts", &ws), None);
    }

    #[test]
    fn test_resolve_file_path_framework() {
        let dir = tempfile::tempdir().unwrap();
        let fw = dir.path().join("swiss-lib");
        fs::create_dir_all(fw.join("packages")).unwrap();

        let mut ws = workspace(dir.path());
        assert_eq!(resolve_file_path("/swiss-packages/core/src/a.ts", &ws), None);

        ws.framework_root = Some(fw.clone());
        assert_eq!(
            resolve_file_path("/swiss-packages/core/src/a.ts", &ws),
            Some(fw.join("packages/core/src/a.ts"))
        );
    }
}
