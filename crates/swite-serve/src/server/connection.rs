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

//! HTTP connection.

use mio::net::TcpStream;
use mio::Interest;
use std::io::{Cursor, ErrorKind, Read, Write};
use std::mem;
use std::time::Instant;

use crate::handler::Handler;
use crate::http::request::Error;
use crate::http::{Request, Response, Status};
use crate::server::Result;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Connection action after handling an event.
pub enum Signal {
    /// Continue with the specified interest.
    Interest(Interest),
    /// Continue without changing the current interest.
    Continue,
    /// Hand the socket to the push channel as a subscriber.
    Subscribe,
    /// Connection was closed.
    Close,
}

// ----------------------------------------------------------------------------

/// Internal buffer state.
#[derive(Debug)]
enum Buffer {
    /// Currently reading a request.
    Reading(Vec<u8>),
    /// Currently writing a response; true when it upgrades the connection.
    Writing(Cursor<Vec<u8>>, bool),
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP connection.
///
/// A connection alternates between reading a request and writing the
/// response; HTTP/1.1 pipelining is not supported, which no browser uses
/// anyway. When the written response was a successful WebSocket handshake,
/// the connection asks the server to move its socket into the subscriber
/// set of the push channel.
#[derive(Debug)]
pub struct Connection {
    /// TCP socket.
    socket: TcpStream,
    /// Read/write buffer.
    buffer: Buffer,
    /// Last activity time.
    time: Instant,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Connection {
    /// Creates a connection.
    pub fn new(socket: TcpStream) -> Self {
        Connection {
            socket,
            buffer: Buffer::Reading(Vec::new()),
            time: Instant::now(),
        }
    }

    /// Consumes the connection and returns the underlying socket.
    pub fn into_socket(self) -> TcpStream {
        self.socket
    }

    /// Returns a mutable reference to the underlying socket.
    pub fn socket(&mut self) -> &mut TcpStream {
        &mut self.socket
    }

    /// Attempts to read data from the socket.
    #[allow(clippy::unnecessary_wraps)]
    pub fn read<H>(&mut self, handler: &H) -> Result<Signal>
    where
        H: Handler,
    {
        if let Buffer::Reading(buffer) = &mut self.buffer {
            self.time = Instant::now();

            // Read all currently available data - if the connection would
            // block, return and wait for the next readable event
            let mut temp = [0u8; 4096];
            let res = loop {
                match self.socket.read(&mut temp) {
                    Ok(0) => return Ok(Signal::Close),

                    // If we read some bytes, try to parse and handle the
                    // request, or otherwise continue reading
                    Ok(bytes) => {
                        buffer.extend_from_slice(&temp[..bytes]);
                        match Request::from_bytes(buffer) {
                            Ok(req) => break handler.handle(req),
                            Err(Error::Incomplete) => continue,
                            Err(Error::Validation(status)) => {
                                break Response::from_status(status);
                            }
                            Err(Error::Parser(_)) => {
                                break Response::from_status(
                                    Status::BadRequest,
                                );
                            }
                        }
                    }

                    // If the connection would block, wait for the next event
                    Err(err) if err.kind() == ErrorKind::WouldBlock => {
                        return Ok(Signal::Continue);
                    }

                    // Connection-level errors close the connection; resets
                    // and aborts are expected and not worth reporting
                    Err(err) => {
                        if !is_benign(err.kind()) {
                            eprintln!("Error: {err}");
                        }
                        return Ok(Signal::Close);
                    }
                }
            };

            // Remember whether the response upgrades the connection, then
            // switch to writing in order to return it to the client
            let upgrade = res.status == Status::SwitchingProtocols;
            let _ = mem::replace(
                &mut self.buffer,
                Buffer::Writing(Cursor::new(res.into_bytes()), upgrade),
            );
        }

        // Switch over to writing state
        Ok(Signal::Interest(Interest::WRITABLE))
    }

    /// Attempts to write data to the socket.
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::unnecessary_wraps)]
    pub fn write(&mut self) -> Result<Signal> {
        if let Buffer::Writing(cursor, _) = &mut self.buffer {
            self.time = Instant::now();

            // Write all remaining data - if the connection would block,
            // return and wait for the next writable event
            loop {
                let pos = cursor.position() as usize;
                let buffer = cursor.get_ref();
                if pos >= buffer.len() {
                    break;
                }

                match self.socket.write(&buffer[pos..]) {
                    Ok(0) => return Ok(Signal::Close),
                    Ok(bytes) => cursor.set_position((pos + bytes) as u64),

                    // If the connection would block, wait for the next event
                    Err(err) if err.kind() == ErrorKind::WouldBlock => {
                        return Ok(Signal::Continue);
                    }

                    // Connection-level errors close the connection
                    Err(err) => {
                        if !is_benign(err.kind()) {
                            eprintln!("Error: {err}");
                        }
                        return Ok(Signal::Close);
                    }
                }
            }
        }

        // If the written response was an upgrade, hand the socket over to
        // the push channel, otherwise switch back to reading state
        let buffer =
            mem::replace(&mut self.buffer, Buffer::Reading(Vec::new()));
        if let Buffer::Writing(_, true) = buffer {
            return Ok(Signal::Subscribe);
        }
        Ok(Signal::Interest(Interest::READABLE))
    }

    /// Returns whether the connection is currently writing data.
    pub fn is_writing(&self) -> bool {
        matches!(self.buffer, Buffer::Writing(_, _))
    }

    /// Checks if the connection has timed out.
    pub fn is_timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.time).as_secs() > 30
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Checks whether an I/O error kind is an expected disconnect.
fn is_benign(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}
