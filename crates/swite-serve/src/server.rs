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

//! HTTP server.

use crossbeam::channel::{Receiver, TryRecvError};
use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Token, Waker};
use slab::Slab;
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tungstenite::protocol::{Role, WebSocketConfig};
use tungstenite::{Message, WebSocket};

use super::handler::Handler;
use super::server::connection::{Connection, Signal};

mod builder;
mod connection;
mod error;
mod poller;

pub use builder::Builder;
pub use error::{Error, Result};
use poller::Poller;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP server.
///
/// The server multiplexes acceptors, HTTP connections and WebSocket
/// subscribers on a single mio poll loop. Connections that complete a
/// WebSocket handshake move from the connection pool into the subscriber
/// set, where they receive every message pushed through the broadcast
/// receiver passed to [`Server::poll`]. Subscribers never talk back - a
/// subscriber whose send fails is silently dropped, and the client is
/// expected to reconnect and resynchronize itself.
pub struct Server<H>
where
    H: Handler,
{
    /// Handler for incoming requests.
    handler: H,
    /// Poller for I/O events.
    events: Poller,
    /// Acceptors for incoming connections.
    acceptors: Vec<TcpListener>,
    /// HTTP connections.
    connections: Slab<Connection>,
    /// Push channel subscribers.
    subscribers: Slab<WebSocket<TcpStream>>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl<H> Server<H>
where
    H: Handler,
{
    /// Creates a server listening on the given address.
    ///
    /// If the address is busy, an ephemeral port is chosen instead - check
    /// [`Server::local_addr`] for the effective one.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use swite_serve::handler::NotFound;
    /// use swite_serve::server::Server;
    ///
    /// // Create server
    /// let server = Server::new(NotFound, "127.0.0.1:3000")?;
    /// println!("Listening on {}", server.local_addr()?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<A>(handler: H, addr: A) -> Result<Self>
    where
        A: ToSocketAddrs,
    {
        Builder::new(handler).bind(addr)?.listen()
    }

    /// Returns the effective address of the first acceptor.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let acceptor = self.acceptors.first().ok_or(Error::NoAddress)?;
        acceptor.local_addr().map_err(Into::into)
    }

    /// Returns the waker for waking the server from its poll loop.
    #[must_use]
    pub fn waker(&self) -> Arc<Waker> {
        self.events.waker()
    }

    /// Polls the server for incoming events.
    ///
    /// The receiver carries pre-serialized push messages; whenever the
    /// waker is triggered, all queued messages are drained and broadcast
    /// to every subscriber.
    #[allow(clippy::too_many_lines)]
    pub fn poll(&mut self, receiver: Option<&Receiver<String>>) -> Result {
        self.events.poll(Some(Duration::from_secs(10)))?;

        // Collect and clean up timed out connections
        let now = Instant::now();
        let timed_out: Vec<usize> = self
            .connections
            .iter()
            .filter(|(_, conn)| conn.is_timed_out(now))
            .map(|(n, _)| n)
            .collect();
        for n in timed_out {
            if let Some(conn) = self.connections.try_remove(n) {
                let mut socket = conn.into_socket();
                self.events.deregister(&mut socket)?;
            }
        }

        // Handle events - tokens below the acceptor count address the
        // acceptors themselves, everything else addresses connections
        let start = self.acceptors.len();
        for event in &self.events {
            let n: usize = event.token().into();

            // Received a waker event, so drain and broadcast push messages
            if n == usize::MAX {
                if let Some(receiver) = receiver {
                    broadcast(&mut self.subscribers, receiver)?;
                }
                continue;
            }

            if let Some(acceptor) = self.acceptors.get(n) {
                // Accept new connections - note that we need to run this in
                // a loop, as browsers open several connections at once
                loop {
                    match acceptor.accept() {
                        Ok((socket, _addr)) => {
                            let n = self
                                .connections
                                .insert(Connection::new(socket));
                            self.events.register(
                                self.connections[n].socket(),
                                Token(start + n),
                                Interest::READABLE,
                            )?;
                        }

                        // Everything except would block is an error
                        Err(err) => {
                            if err.kind() != ErrorKind::WouldBlock {
                                eprintln!("Accept error: {err}");
                            }
                            break;
                        }
                    }
                }
            } else if let Some(conn) = self.connections.get_mut(n - start) {
                // Collect signals to process, which we do after processing
                // all events in order to make the borrow checker happy
                let mut signals = Vec::new();
                if event.is_readable() {
                    signals.push((conn.read(&self.handler)?, n));
                }
                if event.is_writable() {
                    signals.push((conn.write()?, n));
                }

                // Handle signals after reading or writing on the socket -
                // this tells us what to do next with the connection
                for (signal, n) in signals {
                    match signal {
                        // Change of interest - reregister with poller
                        Signal::Interest(mut interest) => {
                            let conn = &mut self.connections[n - start];
                            if conn.is_writing() {
                                interest |= Interest::WRITABLE;
                            }
                            self.events.reregister(
                                conn.socket(),
                                Token(n),
                                interest,
                            )?;
                        }

                        // Close connection and deregister from poller
                        Signal::Close => {
                            let conn = self.connections.remove(n - start);
                            let mut socket = conn.into_socket();
                            self.events.deregister(&mut socket)?;
                        }

                        // Move connection into the subscriber set - we don't
                        // listen on subscribers, they only receive pushes
                        Signal::Subscribe => {
                            let conn = self.connections.remove(n - start);
                            let mut socket = conn.into_socket();
                            self.events.deregister(&mut socket)?;
                            self.subscribers.insert(
                                WebSocket::from_raw_socket(
                                    socket,
                                    Role::Server,
                                    Some(WebSocketConfig::default()),
                                ),
                            );
                        }

                        // Continue without changes
                        Signal::Continue => {}
                    }
                }
            }
        }

        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Drains the receiver and broadcasts each message to all subscribers.
///
/// Subscribers whose socket errored are dropped, which is fine: the client
/// script reconnects and triggers a full reload, so no state is lost
/// beyond a moment of staleness.
fn broadcast(
    subscribers: &mut Slab<WebSocket<TcpStream>>,
    receiver: &Receiver<String>,
) -> Result {
    loop {
        match receiver.try_recv() {
            Ok(message) => {
                subscribers.retain(|_, socket| {
                    socket
                        .send(Message::Text(message.clone().into()))
                        .is_ok()
                });
            }
            Err(TryRecvError::Empty) => return Ok(()),
            Err(TryRecvError::Disconnected) => {
                return Err(Error::Disconnected);
            }
        }
    }
}
