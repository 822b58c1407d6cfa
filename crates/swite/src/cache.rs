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

//! Compilation cache.
//!
//! Compiled modules are cached under their canonical absolute source path.
//! An entry stays live only while three conditions hold: the source's
//! modification time is unchanged, the resolved dependency list is
//! element-wise identical, and no dependency was modified after the entry
//! was created. The dependency check is what makes the cache honest - a
//! module whose import now resolves somewhere else must recompile even
//! though its own bytes didn't change.
//!
//! Eviction is FIFO with a fixed capacity. Concurrent requests for the
//! same key serialize on a per-key build lock, so at most one compilation
//! is ever in flight per module; later requesters observe the first
//! build's result.

use ahash::AHashMap;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Cache entry.
#[derive(Clone, Debug)]
pub struct Entry {
    /// Compiler output, before rewriting.
    pub compiled: String,
    /// Final rewritten script.
    pub rewritten: String,
    /// Source modification time at entry creation.
    mtime: SystemTime,
    /// Resolved dependency paths, in import order.
    deps: Vec<PathBuf>,
    /// Entry creation time.
    created: SystemTime,
}

// ----------------------------------------------------------------------------

/// Compilation cache.
pub struct Cache {
    /// Cache state.
    state: Mutex<State>,
    /// Per-key build locks.
    builds: Mutex<AHashMap<PathBuf, Arc<Mutex<()>>>>,
    /// Maximum number of entries.
    capacity: usize,
}

/// Cache state.
#[derive(Default)]
struct State {
    /// Entries by source path.
    entries: AHashMap<PathBuf, Entry>,
    /// Insertion order, for FIFO eviction.
    order: VecDeque<PathBuf>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Cache {
    /// Creates a compilation cache with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            builds: Mutex::new(AHashMap::new()),
            capacity,
        }
    }

    /// Returns the rewritten script for the given path, if the entry is
    /// live.
    ///
    /// The `deps_of` callback re-resolves the dependency list of the cached
    /// compiler output; an entry whose dependencies resolve differently
    /// than at creation time is invalid, as is one whose source or
    /// dependencies were modified since.
    pub fn get<F>(&self, path: &Path, deps_of: F) -> Option<String>
    where
        F: FnOnce(&str) -> Vec<PathBuf>,
    {
        let entry = {
            let state = self.state.lock().expect("cache poisoned");
            state.entries.get(path)?.clone()
        };

        // Condition (a): the source is unchanged
        if modified(path) != Some(entry.mtime) {
            info!(path = %path.display(), "cache invalidated: file modified");
            self.invalidate(path);
            return None;
        }

        // Condition (b): dependencies resolve as they did at creation
        if deps_of(&entry.compiled) != entry.deps {
            info!(
                path = %path.display(),
                "cache invalidated: dependency changed"
            );
            self.invalidate(path);
            return None;
        }

        // Condition (c): no dependency is newer than the entry
        let stale = entry.deps.iter().any(|dep| {
            modified(dep).is_none_or(|mtime| mtime > entry.created)
        });
        if stale {
            info!(
                path = %path.display(),
                "cache invalidated: dependency newer than entry"
            );
            self.invalidate(path);
            return None;
        }

        debug!(path = %path.display(), "cache hit");
        Some(entry.rewritten)
    }

    /// Records an entry for the given path.
    ///
    /// When the cache is at capacity, the oldest entry is evicted first.
    pub fn set<F>(
        &self, path: &Path, compiled: String, rewritten: String, deps_of: F,
    ) where
        F: FnOnce(&str) -> Vec<PathBuf>,
    {
        let Some(mtime) = modified(path) else {
            // The source vanished mid-build, nothing worth remembering
            return;
        };
        let entry = Entry {
            deps: deps_of(&compiled),
            compiled,
            rewritten,
            mtime,
            created: SystemTime::now(),
        };

        let mut state = self.state.lock().expect("cache poisoned");
        if state.entries.insert(path.to_path_buf(), entry).is_none() {
            state.order.push_back(path.to_path_buf());
        }

        // Evict in insertion order - keys whose entry was already dropped
        // by invalidation are skipped
        while state.entries.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            if state.entries.remove(&oldest).is_some() {
                debug!(path = %oldest.display(), "cache evicted");
            }
        }
    }

    /// Drops the entry for the given path, if present.
    pub fn invalidate(&self, path: &Path) {
        let mut state = self.state.lock().expect("cache poisoned");
        state.entries.remove(path);
    }

    /// Drops all entries.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("cache poisoned");
        let count = state.entries.len();
        state.entries.clear();
        state.order.clear();
        info!(count, "cache cleared");
    }

    /// Checks whether a live-or-stale entry exists for the given path.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        let state = self.state.lock().expect("cache poisoned");
        state.entries.contains_key(path)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("cache poisoned");
        state.entries.len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the build lock for the given path.
    ///
    /// Holding the returned lock across the compile-and-set sequence
    /// guarantees at most one build in flight per key; a later requester
    /// blocks on the lock and then observes the finished entry.
    #[must_use]
    pub fn build_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut builds = self.builds.lock().expect("cache poisoned");
        builds
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Returns the modification time of a path, if it exists.
fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn no_deps(_: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    #[test]
    fn test_get_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ui");
        fs::write(&path, "source").unwrap();

        let cache = Cache::new(10);
        assert_eq!(cache.get(&path, no_deps), None);

        cache.set(&path, "compiled".into(), "rewritten".into(), no_deps);
        assert_eq!(cache.get(&path, no_deps), Some("rewritten".into()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_on_modify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ui");
        fs::write(&path, "v1").unwrap();

        let cache = Cache::new(10);
        cache.set(&path, "compiled".into(), "rewritten".into(), no_deps);

        // Rewrite the source with a strictly newer timestamp
        std::thread::sleep(Duration::from_millis(20));
        fs::write(&path, "v2 with more bytes").unwrap();
        assert_eq!(cache.get(&path, no_deps), None);
        assert!(!cache.contains(&path));
    }

    #[test]
    fn test_invalidate_on_dependency_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ui");
        fs::write(&path, "source").unwrap();

        let cache = Cache::new(10);
        let dep = dir.path().join("dep.ts");
        fs::write(&dep, "dep").unwrap();

        let deps = vec![dep.clone()];
        cache.set(&path, "compiled".into(), "rewritten".into(), |_| {
            deps.clone()
        });

        // Same dependency list: live
        assert!(cache.get(&path, |_| deps.clone()).is_some());

        // Different dependency list: invalid
        let other = vec![dir.path().join("other.ts")];
        assert_eq!(cache.get(&path, |_| other.clone()), None);
    }

    #[test]
    fn test_invalidate_on_newer_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ui");
        let dep = dir.path().join("dep.ts");
        fs::write(&path, "source").unwrap();
        fs::write(&dep, "dep").unwrap();

        let cache = Cache::new(10);
        let deps = vec![dep.clone()];
        cache.set(&path, "compiled".into(), "rewritten".into(), |_| {
            deps.clone()
        });

        // Touch the dependency after entry creation
        std::thread::sleep(Duration::from_millis(20));
        fs::write(&dep, "dep changed").unwrap();
        assert_eq!(cache.get(&path, |_| deps.clone()), None);
    }

    #[test]
    fn test_fifo_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(2);

        let paths: Vec<PathBuf> = (0..3)
            .map(|n| {
                let path = dir.path().join(format!("{n}.ui"));
                fs::write(&path, "source").unwrap();
                path
            })
            .collect();

        for path in &paths {
            cache.set(path, "c".into(), "r".into(), no_deps);
        }

        // The oldest entry was evicted, the newer two remain
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&paths[0]));
        assert!(cache.contains(&paths[1]));
        assert!(cache.contains(&paths[2]));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ui");
        fs::write(&path, "source").unwrap();

        let cache = Cache::new(10);
        cache.set(&path, "c".into(), "r".into(), no_deps);
        cache.clear();
        assert!(cache.is_empty());
    }
}
