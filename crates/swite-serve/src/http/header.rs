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

//! HTTP header.

use std::collections::btree_map::{BTreeMap, Iter};
use std::fmt;
use std::str::FromStr;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// HTTP header.
///
/// Headers are modeled as an enum for type-safety in middlewares - headers
/// we don't know are silently dropped during request parsing, which is fine,
/// as we never need to proxy or echo them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Header {
    /// `Allow` header.
    Allow,
    /// `Cache-Control` header.
    CacheControl,
    /// `Connection` header.
    Connection,
    /// `Content-Length` header.
    ContentLength,
    /// `Content-Type` header.
    ContentType,
    /// `Expires` header.
    Expires,
    /// `Host` header.
    Host,
    /// `Location` header.
    Location,
    /// `Pragma` header.
    Pragma,
    /// `Sec-WebSocket-Accept` header.
    SecWebSocketAccept,
    /// `Sec-WebSocket-Key` header.
    SecWebSocketKey,
    /// `Sec-WebSocket-Version` header.
    SecWebSocketVersion,
    /// `Upgrade` header.
    Upgrade,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Header {
    /// Returns the name of the header.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Header::Allow => "Allow",
            Header::CacheControl => "Cache-Control",
            Header::Connection => "Connection",
            Header::ContentLength => "Content-Length",
            Header::ContentType => "Content-Type",
            Header::Expires => "Expires",
            Header::Host => "Host",
            Header::Location => "Location",
            Header::Pragma => "Pragma",
            Header::SecWebSocketAccept => "Sec-WebSocket-Accept",
            Header::SecWebSocketKey => "Sec-WebSocket-Key",
            Header::SecWebSocketVersion => "Sec-WebSocket-Version",
            Header::Upgrade => "Upgrade",
        }
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl FromStr for Header {
    type Err = ();

    /// Parses a header from a string, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::http::Header;
    ///
    /// // Parse header from string
    /// let header: Header = "content-type".parse().unwrap();
    /// assert_eq!(header, Header::ContentType);
    /// ```
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.to_ascii_lowercase();
        match name.as_str() {
            "allow" => Ok(Header::Allow),
            "cache-control" => Ok(Header::CacheControl),
            "connection" => Ok(Header::Connection),
            "content-length" => Ok(Header::ContentLength),
            "content-type" => Ok(Header::ContentType),
            "expires" => Ok(Header::Expires),
            "host" => Ok(Header::Host),
            "location" => Ok(Header::Location),
            "pragma" => Ok(Header::Pragma),
            "sec-websocket-accept" => Ok(Header::SecWebSocketAccept),
            "sec-websocket-key" => Ok(Header::SecWebSocketKey),
            "sec-websocket-version" => Ok(Header::SecWebSocketVersion),
            "upgrade" => Ok(Header::Upgrade),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Header {
    /// Formats the header for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP header map.
///
/// Requests and responses share this map. Insertion order doesn't matter on
/// the wire, so a [`BTreeMap`] keyed by the [`Header`] enum keeps iteration
/// deterministic, which makes responses byte-stable across runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    /// Header values.
    map: BTreeMap<Header, String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Headers {
    /// Creates a header map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any previous value.
    pub fn insert<V>(&mut self, header: Header, value: V)
    where
        V: ToString,
    {
        self.map.insert(header, value.to_string());
    }

    /// Returns the value of the given header, if present.
    #[must_use]
    pub fn get(&self, header: Header) -> Option<&str> {
        self.map.get(&header).map(String::as_str)
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an iterator over the headers.
    pub fn iter(&self) -> Iter<'_, Header, String> {
        self.map.iter()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a Header, &'a String);
    type IntoIter = Iter<'a, Header, String>;

    /// Returns an iterator over the headers.
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(Header, String)> for Headers {
    /// Creates a header map from an iterator.
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (Header, String)>,
    {
        Self { map: iter.into_iter().collect() }
    }
}
