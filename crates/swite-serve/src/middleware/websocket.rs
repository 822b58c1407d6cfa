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

//! Middleware for WebSocket handshakes.

use base64::prelude::*;
use sha1_smol::Sha1;

use crate::handler::Handler;
use crate::http::{Header, Method, Request, Response, Status};

use super::Middleware;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Middleware for WebSocket handshakes.
///
/// This middleware performs the server side of the WebSocket handshake as
/// per RFC 6455: it validates the method and required headers, and answers
/// with "101 Switching Protocols" and the computed accept key. The server
/// watches for that status to move the connection from the HTTP pool into
/// the push channel's subscriber set.
///
/// # Examples
///
/// ```
/// use swite_serve::handler::{Handler, Stack};
/// use swite_serve::http::{Header, Method, Request, Status};
/// use swite_serve::middleware::WebSocketHandshake;
///
/// // Create stack with middleware
/// let stack = Stack::new().with(WebSocketHandshake::default());
///
/// // Create request
/// let req = Request::new()
///     .method(Method::Get)
///     .header(Header::Connection, "Upgrade")
///     .header(Header::Upgrade, "websocket")
///     .header(Header::SecWebSocketKey, "dGhlIHNhbXBsZSBub25jZQ==")
///     .header(Header::SecWebSocketVersion, "13");
///
/// // Handle request with stack
/// let res = stack.handle(req);
/// assert_eq!(res.status, Status::SwitchingProtocols);
/// assert_eq!(res.headers.get(Header::Upgrade), Some("websocket"));
/// ```
#[derive(Default)]
pub struct WebSocketHandshake;

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Middleware for WebSocketHandshake {
    /// Processes the given request.
    fn process(&self, req: Request, next: &dyn Handler) -> Response {
        // Quickly forward requests that are not upgrades to the next handler
        let Some(upgrade) = req.headers.get(Header::Upgrade) else {
            return next.handle(req);
        };

        // We're only interested in WebSocket upgrades, so again, forward all
        // other upgrade requests. If the request is indeed a WebSocket
        // upgrade, check all preconditions and answer errors as per RFC.
        if !upgrade.eq_ignore_ascii_case("websocket") {
            return next.handle(req);
        }

        // 1. Ensure method is GET
        if req.method != Method::Get {
            return Response::from_status(Status::MethodNotAllowed)
                .header(Header::Allow, "GET");
        }

        // 2. Ensure connection header is present and contains upgrade
        let Some(connection) = req.headers.get(Header::Connection) else {
            return Response::from_status(Status::BadRequest);
        };
        let mut iter = connection.split(',').map(str::trim);
        if !iter.any(|value| value.eq_ignore_ascii_case("upgrade")) {
            return Response::from_status(Status::BadRequest);
        }

        // 3. Ensure WebSocket version is 13
        if Some("13") != req.headers.get(Header::SecWebSocketVersion) {
            return Response::from_status(Status::UpgradeRequired)
                .header(Header::Upgrade, "websocket")
                .header(Header::SecWebSocketVersion, "13");
        }

        // 4. Ensure WebSocket key is present
        let Some(key) = req.headers.get(Header::SecWebSocketKey) else {
            return Response::from_status(Status::BadRequest);
        };

        // Return response for WebSocket handshake
        let accept = generate_accept_key(key);
        Response::new()
            .status(Status::SwitchingProtocols)
            .header(Header::Upgrade, "websocket")
            .header(Header::Connection, "Upgrade")
            .header(Header::SecWebSocketAccept, accept)
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Generates the accept key for the WebSocket handshake.
///
/// This follows RFC 6455 Section 4.2.2: the client key is concatenated with
/// the protocol GUID, hashed with SHA-1, and Base64 encoded.
fn generate_accept_key<K>(key: K) -> String
where
    K: AsRef<[u8]>,
{
    let mut hasher = Sha1::new();
    hasher.update(key.as_ref());
    hasher.update(b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11");
    BASE64_STANDARD.encode(hasher.digest().bytes())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_accept_key() {
        // Known pair from RFC 6455 Section 1.3
        assert_eq!(
            generate_accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }
}
