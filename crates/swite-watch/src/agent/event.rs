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

//! File event.

use std::fs::FileType;
use std::path::{Path, PathBuf};

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// File kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// File.
    File,
    /// Folder.
    Folder,
    /// Symbolic link.
    Link,
}

// ----------------------------------------------------------------------------

/// File event.
///
/// Events are emitted after the debounce window closed, so they describe the
/// settled state of the file system, not every intermediate write. Renames
/// surface as a removal of the old path and a creation of the new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Creation event.
    Create {
        /// File kind.
        kind: Kind,
        /// File path.
        path: PathBuf,
    },

    /// Modification event.
    Modify {
        /// File kind.
        kind: Kind,
        /// File path.
        path: PathBuf,
    },

    /// Removal event.
    Remove {
        /// File path.
        path: PathBuf,
    },
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Event {
    /// Returns the file kind of the event, if known.
    ///
    /// Removals don't carry a kind, as the path is gone by the time the
    /// debounce window closes and its type can no longer be determined.
    #[must_use]
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Event::Create { kind, .. } | Event::Modify { kind, .. } => {
                Some(*kind)
            }
            Event::Remove { .. } => None,
        }
    }

    /// Returns the file path of the event.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Event::Create { path, .. }
            | Event::Modify { path, .. }
            | Event::Remove { path } => path,
        }
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl From<FileType> for Kind {
    /// Creates a file kind from a file type.
    fn from(value: FileType) -> Self {
        if value.is_symlink() {
            Kind::Link
        } else if value.is_dir() {
            Kind::Folder
        } else {
            Kind::File
        }
    }
}
