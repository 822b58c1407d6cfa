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

//! File monitor.

use crossbeam::channel::{unbounded, Receiver};
use notify::{
    Config, Event, RecommendedWatcher, RecursiveMode, Result, Watcher,
};
use std::collections::btree_set::BTreeSet;
use std::path::{Path, PathBuf};
use std::{fmt, fs};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// File monitor.
///
/// This is a small convenience wrapper around the [`notify`] crate, which
/// uses a [`crossbeam`] channel to simplify event handling. It tracks the
/// set of watched roots and makes sure they never overlap, because some
/// watcher backends misbehave when nested paths are registered separately.
/// When a root is added that covers an already-watched path, the covered
/// path is detached; every root is watched recursively.
pub struct Monitor {
    /// File watcher.
    watcher: Box<dyn Watcher>,
    /// Requested roots.
    roots: BTreeSet<PathBuf>,
    /// Actively attached roots.
    attached: BTreeSet<PathBuf>,
    /// Message receiver.
    receiver: Receiver<Result<Event>>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Monitor {
    /// Creates a file monitor.
    ///
    /// Normally, it's not necessary to use this function, since the
    /// [`Default`] implementation sets up the [`RecommendedWatcher`], but a
    /// specific backend like the [`PollWatcher`][] can be passed for file
    /// systems where the native backend is unreliable.
    ///
    /// [`PollWatcher`]: notify::PollWatcher
    ///
    /// # Panics
    ///
    /// Panics if [`notify`] returns an error on [`Watcher`] creation, as the
    /// file monitor is required for the file agent.
    #[must_use]
    pub fn new<W>(config: Config) -> Self
    where
        W: 'static + Watcher,
    {
        let (sender, receiver) = unbounded();

        // Disable following of symbolic links - workspace packages are often
        // linked into dependency trees, and following them would make events
        // surface under paths the owner never asked to watch
        let config = config.with_follow_symlinks(false);
        let h = move |res| {
            let _ = sender.send(res);
        };

        // We deliberately use unwrap here, as the capability to create the
        // backing watcher is a fundamental requirement of the file monitor
        Self {
            watcher: Box::new(W::new(h, config).unwrap()),
            roots: BTreeSet::new(),
            attached: BTreeSet::new(),
            receiver,
        }
    }

    /// Watches the given path, recursively.
    ///
    /// Watching a path that is already covered by a watched ancestor is a
    /// no-op, indicated by the return value.
    ///
    /// # Errors
    ///
    /// Errors returned by [`notify`] are forwarded. Other than that, the
    /// given path must exist and be accessible, as it is canonicalized to
    /// uniquely identify it across the file system.
    pub fn watch<P>(&mut self, path: P) -> Result<bool>
    where
        P: AsRef<Path>,
    {
        let path = fs::canonicalize(path)?;
        if self.roots.insert(path) {
            self.configure()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Unwatches the given path.
    ///
    /// # Errors
    ///
    /// Errors returned by [`notify`] are forwarded. Other than that, the
    /// given path must exist and be accessible, as it is canonicalized to
    /// uniquely identify it across the file system.
    pub fn unwatch<P>(&mut self, path: P) -> Result<bool>
    where
        P: AsRef<Path>,
    {
        let path = fs::canonicalize(path)?;
        if self.roots.remove(&path) {
            self.configure()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Returns the watched roots.
    #[must_use]
    pub fn roots(&self) -> &BTreeSet<PathBuf> {
        &self.roots
    }

    /// Returns the message receiver.
    #[must_use]
    pub fn as_receiver(&self) -> &Receiver<Result<Event>> {
        &self.receiver
    }

    /// Reconciles the set of attached roots with the requested roots.
    ///
    /// Roots covered by a watched ancestor are not attached themselves, so
    /// each file is only ever observed once, regardless of backend.
    fn configure(&mut self) -> Result<()> {
        let effective: BTreeSet<PathBuf> = self
            .roots
            .iter()
            .filter(|path| {
                !self
                    .roots
                    .iter()
                    .any(|other| *path != other && path.starts_with(other))
            })
            .cloned()
            .collect();

        // Detach roots that are no longer effective
        for path in self.attached.difference(&effective) {
            self.watcher.unwatch(path)?;
        }

        // Attach roots that became effective
        for path in effective.difference(&self.attached) {
            self.watcher.watch(path, RecursiveMode::Recursive)?;
        }

        // Remember attached roots
        self.attached = effective;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Default for Monitor {
    /// Creates a file monitor with the recommended watcher.
    fn default() -> Self {
        Self::new::<RecommendedWatcher>(Config::default())
    }
}

impl fmt::Debug for Monitor {
    /// Formats the file monitor for debugging.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("roots", &self.roots)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}
