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

//! File handler.

use crossbeam::channel::{after, never, select_biased, Receiver};
use notify::event::EventKind;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, mem};
use walkdir::WalkDir;

use super::error::Result;
use super::event::{Event, Kind};
use super::filter::Filter;
use super::monitor::Monitor;
use super::Action;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Pending change, recorded while the debounce window is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    /// Path appeared.
    Create,
    /// Path was written to.
    Write,
    /// Path vanished.
    Remove,
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// File handler.
///
/// The handler multiplexes control actions, raw watcher events, and a settle
/// timer. Raw events are collected into a queue keyed by path; the queue is
/// flushed only after no event arrived for the debounce timeout, at which
/// point each path is reconciled against the file system. This collapses
/// editor write bursts into a single event per path, and turns renames into
/// a removal and a creation.
pub struct Handler {
    /// Action receiver.
    receiver: Receiver<Action>,
    /// File monitor.
    monitor: Monitor,
    /// Event filter.
    filter: Filter,
    /// Event callback.
    callback: Box<dyn FnMut(Result<Event>) -> Result>,
    /// Queue of pending changes.
    queue: BTreeMap<PathBuf, Pending>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Handler {
    /// Creates a file handler.
    pub fn new(
        receiver: Receiver<Action>, monitor: Monitor, filter: Filter,
        callback: Box<dyn FnMut(Result<Event>) -> Result>,
    ) -> Self {
        Self { receiver, monitor, filter, callback, queue: BTreeMap::new() }
    }

    /// Handles messages from the file agent and the file monitor.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn handle(&mut self, timeout: Duration) -> Result {
        // Only arm the settle timer when there's something to flush - as long
        // as events keep arriving, the timer is re-armed on every iteration,
        // so the queue is flushed once writes stabilized for the timeout
        let wait = (!self.queue.is_empty()).then_some(timeout);

        // Select over the control channel, the monitor channel and the settle
        // timer. Note that we use `select_biased` to prioritize ordering of
        // processing, so control actions always win over event floods.
        select_biased! {
            // Handle messages from the file agent, which are sent whenever
            // the owner instructs it to watch or unwatch a given path
            recv(self.receiver) -> message => {
                let res = match message? {
                    Action::Watch(path) => self.monitor.watch(&path),
                    Action::Unwatch(path) => self.monitor.unwatch(&path),
                };
                if let Err(err) = res {
                    (self.callback)(Err(err.into()))?;
                }
            }

            // Handle messages from the file monitor, which are sent whenever
            // a file system event is detected on a watched root
            recv(self.monitor.as_receiver()) -> message => {
                match message? {
                    Ok(event) => self.enqueue(event),
                    Err(err) => (self.callback)(Err(err.into()))?,
                }
            }

            // Handle the settle timer, which fires when the queue is not
            // empty and nothing happened for the debounce timeout
            recv(wait.map_or_else(never, after)) -> _ => {
                let queue = mem::take(&mut self.queue);
                for (path, pending) in queue {
                    self.settle(path, pending)?;
                }
            }
        }

        Ok(())
    }

    /// Adds a raw watcher event to the queue.
    ///
    /// Later observations win: a write after a creation keeps the creation,
    /// while a removal always replaces whatever was recorded before, and a
    /// re-creation after a removal replaces the removal.
    fn enqueue(&mut self, event: notify::Event) {
        let pending = match event.kind {
            EventKind::Create(_) => Pending::Create,
            EventKind::Modify(_) => Pending::Write,
            EventKind::Remove(_) => Pending::Remove,
            _ => return,
        };

        // Queue all permitted paths of the event - note that rename events
        // carry both sides, which reconciliation sorts out after settling
        for path in event.paths {
            if !self.allows(&path) {
                continue;
            }
            match self.queue.entry(path) {
                Entry::Vacant(entry) => {
                    entry.insert(pending);
                }
                Entry::Occupied(mut entry) => {
                    let merged = match (*entry.get(), pending) {
                        // A write after a creation is still a creation
                        (Pending::Create, Pending::Write) => Pending::Create,
                        (_, next) => next,
                    };
                    entry.insert(merged);
                }
            }
        }
    }

    /// Reconciles a settled change against the file system.
    ///
    /// The recorded pending state only serves as a hint - what counts is
    /// whether the path exists once writes stabilized. A path that vanished
    /// is a removal even if we only saw writes, which is how renames on
    /// backends that report them as modifications are resolved.
    fn settle(&mut self, path: PathBuf, pending: Pending) -> Result {
        let Ok(meta) = fs::symlink_metadata(&path) else {
            return (self.callback)(Ok(Event::Remove { path }));
        };

        let kind = Kind::from(meta.file_type());
        match pending {
            Pending::Create | Pending::Remove => {
                // Folders that appear at once, e.g. by a move into the tree,
                // don't produce events for their contents on all backends,
                // so we synthesize creations for everything inside
                if kind == Kind::Folder {
                    self.descend(&path)?;
                }
                (self.callback)(Ok(Event::Create { kind, path }))
            }
            Pending::Write => {
                (self.callback)(Ok(Event::Modify { kind, path }))
            }
        }
    }

    /// Emits creation events for the contents of a new folder.
    fn descend(&mut self, path: &Path) -> Result {
        // Collect first: the traversal filter borrows the monitor and the
        // event filter, while the callback needs exclusive access
        let entries: Vec<walkdir::Result<walkdir::DirEntry>> =
            WalkDir::new(path)
                .min_depth(1)
                .into_iter()
                .filter_entry(|entry| {
                    allowed(&self.monitor, &self.filter, entry.path())
                })
                .collect();

        for entry in entries {
            let entry = entry?;
            let kind = Kind::from(entry.file_type());
            (self.callback)(Ok(Event::Create {
                kind,
                path: entry.into_path(),
            }))?;
        }
        Ok(())
    }

    /// Checks whether the given path is allowed to emit events.
    fn allows(&self, path: &Path) -> bool {
        allowed(&self.monitor, &self.filter, path)
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Checks whether a path below one of the watched roots passes the filter.
///
/// The filter inspects the path relative to its watched root, so watched
/// projects that live below dotted directories keep working.
fn allowed(monitor: &Monitor, filter: &Filter, path: &Path) -> bool {
    let suffix = monitor
        .roots()
        .iter()
        .find_map(|root| path.strip_prefix(root).ok());
    suffix.is_none_or(|suffix| filter.allows(suffix))
}
