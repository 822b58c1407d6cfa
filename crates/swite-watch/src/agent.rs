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

//! File agent.

use crossbeam::channel::{unbounded, Sender};
use std::path::{Path, PathBuf};
use std::thread::{Builder, JoinHandle};
use std::time::Duration;
use std::{fmt, fs};

mod error;
pub mod event;
pub mod filter;
mod handler;
mod monitor;

pub use error::{Error, Result};
pub use event::Event;
pub use filter::Filter;
use handler::Handler;
use monitor::Monitor;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// File agent action.
#[derive(Debug)]
pub enum Action {
    /// Watch path.
    Watch(PathBuf),
    /// Unwatch path.
    Unwatch(PathBuf),
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// File agent.
///
/// The agent owns a dedicated thread on which it multiplexes control
/// messages, raw watcher events and a settle timer. Raw events are queued
/// until no further event arrives for the configured timeout, which gives
/// editors and compilers time to finish writing, and are then reconciled
/// against the file system before being handed to the callback.
pub struct Agent {
    /// Debounce timeout.
    timeout: Duration,
    /// Action sender.
    sender: Sender<Action>,
    /// Join handle for the agent thread.
    thread: JoinHandle<Result>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Agent {
    /// Creates a file agent with the default filter.
    ///
    /// # Panics
    ///
    /// Panics if thread creation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use swite_watch::Agent;
    ///
    /// // Create file agent
    /// let agent = Agent::new(Duration::from_millis(100), |event| {
    ///     println!("Event: {event:?}");
    ///     Ok(())
    /// });
    /// ```
    pub fn new<F>(timeout: Duration, f: F) -> Self
    where
        F: FnMut(Result<Event>) -> Result + Send + 'static,
    {
        Self::with_filter(timeout, Filter::default(), f)
    }

    /// Creates a file agent with the given filter.
    ///
    /// # Panics
    ///
    /// Panics if thread creation fails.
    pub fn with_filter<F>(timeout: Duration, filter: Filter, f: F) -> Self
    where
        F: FnMut(Result<Event>) -> Result + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let h = move || -> Result {
            let mut handler =
                Handler::new(receiver, Monitor::default(), filter, Box::new(f));

            // Start event loop, which will automatically exit when the file
            // agent is dropped, since the sender disconnects the receiver
            loop {
                handler.handle(timeout)?;
            }
        };

        // We deliberately use unwrap here, as the capability to spawn threads
        // is a fundamental requirement of the file agent
        let thread = Builder::new()
            .name(String::from("swite/watch"))
            .spawn(h)
            .unwrap();

        // Return file agent
        Self { timeout, sender, thread }
    }

    /// Watches the given path, recursively.
    ///
    /// This method submits an [`Action`] to watch the given path, which is
    /// processed in the next iteration of the agent's event loop. The path
    /// must exist, as it is canonicalized before being submitted.
    ///
    /// # Errors
    ///
    /// If action submission fails, [`Error::Disconnected`] is returned, which
    /// can only happen after the agent thread terminated.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use std::time::Duration;
    /// use swite_watch::Agent;
    ///
    /// // Create file agent and start watching
    /// let agent = Agent::new(Duration::from_millis(100), |_| Ok(()));
    /// agent.watch(".")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn watch<P>(&self, path: P) -> Result
    where
        P: AsRef<Path>,
    {
        self.sender
            .send(Action::Watch(fs::canonicalize(path)?))
            .map_err(Into::into)
    }

    /// Unwatches the given path.
    ///
    /// # Errors
    ///
    /// If action submission fails, [`Error::Disconnected`] is returned, which
    /// can only happen after the agent thread terminated.
    pub fn unwatch<P>(&self, path: P) -> Result
    where
        P: AsRef<Path>,
    {
        self.sender
            .send(Action::Unwatch(fs::canonicalize(path)?))
            .map_err(Into::into)
    }

    /// Returns the debounce timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks whether the agent thread has terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.thread.is_finished()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl fmt::Debug for Agent {
    /// Formats the file agent for debugging.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
