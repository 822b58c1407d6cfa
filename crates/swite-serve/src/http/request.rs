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

//! HTTP request.

use std::path::{Component, Path};
use std::str::{self, FromStr};
use std::result;
use thiserror::Error;

use super::header::{Header, Headers};
use super::method::Method;
use super::status::Status;
use super::uri::Uri;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// HTTP request error.
#[derive(Debug, Error)]
pub enum Error {
    /// Request is incomplete, more data is needed.
    #[error("request incomplete")]
    Incomplete,

    /// Request failed validation with the given status.
    #[error("request invalid: {0}")]
    Validation(Status),

    /// Request could not be parsed.
    #[error(transparent)]
    Parser(#[from] httparse::Error),
}

/// HTTP request result.
pub type Result<T = ()> = result::Result<T, Error>;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP request.
///
/// Requests are owned: the module pipeline re-targets request URIs across
/// handlers (e.g. when a `.js` request is answered by a `.ui` source), so
/// borrowing from the connection's read buffer would only complicate things.
///
/// # Examples
///
/// ```
/// use swite_serve::http::{Method, Request};
///
/// // Create request
/// let req = Request::new()
///     .method(Method::Get)
///     .uri("/src/index.ui");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: Headers,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Request {
    /// Creates a request.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a request from the given bytes.
    ///
    /// Requests are parsed with the [`httparse`] crate - one of the few
    /// dependencies we rely on, as it's an efficient and well-tested parser.
    /// Several validations protect against the most common vulnerabilities,
    /// including length checks and path traversal attempts. NUL characters
    /// are already rejected by [`httparse`].
    ///
    /// Bodies are dropped: a module server answers `GET` requests only, so
    /// there is nothing to read beyond the header section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incomplete`] if the buffer holds insufficient data,
    /// [`Error::Validation`] if a limit was exceeded or the request target
    /// is unacceptable, and [`Error::Parser`] for malformed input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use swite_serve::http::{Method, Request};
    ///
    /// // Create request from bytes
    /// let req = Request::from_bytes(b"GET /src/index.ui HTTP/1.1\r\n\r\n")?;
    /// assert_eq!(req.method, Method::Get);
    /// assert_eq!(req.uri.path, "/src/index.ui");
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::missing_panics_doc)]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > 64 * 1024 {
            return Err(Error::Validation(Status::PayloadTooLarge));
        }

        // Initialize buffer for headers and request parser
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);

        // Parse request and convert it into our own representation
        match req.parse(bytes)? {
            httparse::Status::Partial => Err(Error::Incomplete),
            httparse::Status::Complete(_) => {
                // Unpack request method and target - if parsing succeeded,
                // both options are guaranteed to be present
                let method = req
                    .method
                    .expect("invariant")
                    .parse()
                    .map_err(Error::Validation)?;
                let target = req.path.expect("invariant");
                if target.len() > 2 * 1024 {
                    return Err(Error::Validation(Status::UriTooLong));
                }

                // Ensure that the request target starts with a slash, as we
                // do not support proxy requests, and never will
                let uri = Uri::from(target);
                if !uri.path.starts_with('/') {
                    return Err(Error::Validation(Status::BadRequest));
                }

                // Reject path traversal attempts - the quick substring check
                // short-circuits the common case without component iteration
                if uri.path.contains("..") {
                    let mut iter = Path::new(&uri.path).components();
                    if iter.any(|component| component == Component::ParentDir)
                    {
                        return Err(Error::Validation(Status::BadRequest));
                    }
                }

                // Unpack request headers, skipping any we don't know, and
                // enforcing a size limit on individual values
                let mut headers = Headers::new();
                for header in req.headers.iter() {
                    if header.name.is_empty() {
                        break;
                    }
                    if header.value.len() > 4 * 1024 {
                        return Err(Error::Validation(
                            Status::RequestHeaderFieldsTooLarge,
                        ));
                    }
                    if let (Ok(name), Ok(value)) = (
                        Header::from_str(header.name),
                        str::from_utf8(header.value),
                    ) {
                        headers.insert(name, value);
                    }
                }

                // Return request
                Ok(Request { method, uri, headers })
            }
        }
    }
}

impl Request {
    /// Sets the method of the request.
    #[inline]
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI of the request.
    #[inline]
    #[must_use]
    pub fn uri<U>(mut self, uri: U) -> Self
    where
        U: Into<Uri>,
    {
        self.uri = uri.into();
        self
    }

    /// Adds a header to the request.
    #[inline]
    #[must_use]
    pub fn header<V>(mut self, header: Header, value: V) -> Self
    where
        V: ToString,
    {
        self.headers.insert(header, value);
        self
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let req = Request::from_bytes(
            b"GET /src/App.uix?v=1 HTTP/1.1\r\nHost: localhost\r\n\r\n",
        )
        .unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.uri.path, "/src/App.uix");
        assert_eq!(req.headers.get(Header::Host), Some("localhost"));
    }

    #[test]
    fn test_from_bytes_incomplete() {
        let res = Request::from_bytes(b"GET /src/App.uix HTTP/1.1\r\n");
        assert!(matches!(res, Err(Error::Incomplete)));
    }

    #[test]
    fn test_from_bytes_traversal() {
        let res = Request::from_bytes(b"GET /../secret HTTP/1.1\r\n\r\n");
        assert!(matches!(
            res,
            Err(Error::Validation(Status::BadRequest))
        ));
    }

    #[test]
    fn test_from_bytes_method() {
        let res = Request::from_bytes(b"POST /x HTTP/1.1\r\n\r\n");
        assert!(matches!(
            res,
            Err(Error::Validation(Status::MethodNotAllowed))
        ));
    }
}
