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

//! HTTP response.

use std::fs;
use std::io;
use std::path::Path;

use super::header::{Header, Headers};
use super::status::Status;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP response.
///
/// While all members of this struct are public, there are also methods with
/// identical names providing a builder-like interface, plus constructors
/// for the response shapes the module server produces: scripts, plain text
/// errors, redirects and files.
///
/// # Examples
///
/// ```
/// use swite_serve::http::{Header, Response, Status};
///
/// // Create response
/// let res = Response::new()
///     .status(Status::Ok)
///     .header(Header::ContentType, "text/plain; charset=utf-8")
///     .header(Header::ContentLength, 13)
///     .body("Hello, world!");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Response {
    /// Response status.
    pub status: Status,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Response {
    /// Creates a response.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a response from plain text.
    ///
    /// Error bodies must always be plain text, never HTML - a single-page
    /// application fallback that answers script URLs with markup poisons
    /// module caches in ways that are miserable to debug.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::http::{Response, Status};
    ///
    /// // Create plain text response
    /// let res = Response::from_text(Status::NotFound, "File not found: /x");
    /// assert_eq!(res.status, Status::NotFound);
    /// ```
    #[must_use]
    pub fn from_text<S>(status: Status, content: S) -> Response
    where
        S: Into<String>,
    {
        Response::new().status(status).text(content)
    }

    /// Creates a response from a status code, with the reason as body.
    #[must_use]
    pub fn from_status(status: Status) -> Response {
        Response::new() // fmt
            .status(status)
            .text(status.reason())
    }

    /// Creates a response from browser script.
    ///
    /// # Examples
    ///
    /// ```
    /// use swite_serve::http::{Header, Response};
    ///
    /// // Create script response
    /// let res = Response::from_script("export default 1");
    /// assert_eq!(
    ///     res.headers.get(Header::ContentType),
    ///     Some("application/javascript; charset=utf-8"),
    /// );
    /// ```
    #[must_use]
    pub fn from_script<S>(content: S) -> Response
    where
        S: Into<String>,
    {
        let content = content.into();
        Response::new()
            .status(Status::Ok)
            .header(Header::ContentType, "application/javascript; charset=utf-8")
            .header(Header::ContentLength, content.len())
            .body(content)
    }

    /// Creates a response from a file.
    ///
    /// The media type is derived from the file extension. Note that script
    /// sources compiled on demand never take this path - it only serves
    /// passthrough content like stylesheets, images and package internals.
    pub fn from_file<P>(path: P) -> io::Result<Response>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = fs::read(path)?;
        Ok(Response::new()
            .status(Status::Ok)
            .header(Header::ContentType, media_type(path))
            .header(Header::ContentLength, content.len())
            .body(content))
    }

    /// Creates a redirect response.
    #[must_use]
    pub fn redirect<L>(location: L) -> Response
    where
        L: ToString,
    {
        Response::new()
            .status(Status::Found)
            .header(Header::Location, location)
            .header(Header::ContentLength, 0)
    }

    /// Converts the response into bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        // Estimate the response size: status line, then roughly 64 bytes per
        // header, which overshoots a little, and the body with its separator
        let capacity =
            48 + self.headers.len() * 64 + 2 + self.body.len();

        // Create pre-sized buffer and append status line
        let mut buffer = Vec::with_capacity(capacity);
        buffer.extend_from_slice(b"HTTP/1.1 ");
        buffer.extend_from_slice(self.status.to_string().as_bytes());
        buffer.extend_from_slice(b"\r\n");

        // Append all headers to buffer
        for (header, value) in &self.headers {
            buffer.extend_from_slice(header.name().as_bytes());
            buffer.extend_from_slice(b": ");
            buffer.extend_from_slice(value.as_bytes());
            buffer.extend_from_slice(b"\r\n");
        }

        // Append empty line and body to buffer
        buffer.extend_from_slice(b"\r\n");
        buffer.extend_from_slice(&self.body);
        buffer
    }
}

impl Response {
    /// Sets the status of the response.
    #[inline]
    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Adds a header to the response.
    #[inline]
    #[must_use]
    pub fn header<V>(mut self, header: Header, value: V) -> Self
    where
        V: ToString,
    {
        self.headers.insert(header, value);
        self
    }

    /// Sets the body of the response.
    #[inline]
    #[must_use]
    pub fn body<B>(mut self, body: B) -> Self
    where
        B: Into<Vec<u8>>,
    {
        self.body = body.into();
        self
    }

    /// Sets the given text as the body, with matching headers.
    #[must_use]
    pub fn text<S>(self, content: S) -> Self
    where
        S: Into<String>,
    {
        let content = content.into();
        self.header(Header::ContentType, "text/plain; charset=utf-8")
            .header(Header::ContentLength, content.len())
            .body(content)
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Returns the media type for the given path.
///
/// Script extensions, including the framework's component extensions, all
/// map to `application/javascript`, as they only ever leave the server as
/// compiled script.
#[must_use]
pub fn media_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js" | "mjs" | "ts" | "tsx" | "jsx" | "ui" | "uix") => {
            "application/javascript; charset=utf-8"
        }
        Some("css") => "text/css",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_bytes() {
        let res = Response::from_text(Status::Ok, "hi");
        let bytes = res.into_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }

    #[test]
    fn test_media_type() {
        let test_cases = vec![
            ("index.ui", "application/javascript; charset=utf-8"),
            ("App.uix", "application/javascript; charset=utf-8"),
            ("mod.ts", "application/javascript; charset=utf-8"),
            ("main.css", "text/css"),
            ("logo.svg", "image/svg+xml"),
            ("data.bin", "application/octet-stream"),
        ];

        for (path, expected) in test_cases {
            assert_eq!(
                media_type(Path::new(path)),
                expected,
                "Failed for: {path}"
            );
        }
    }
}
