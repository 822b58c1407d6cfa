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

//! HTTP server builder.

use mio::net::TcpListener;
use mio::{Interest, Token};
use slab::Slab;
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::handler::Handler;

use super::poller::Poller;
use super::{Error, Result, Server};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// HTTP server builder.
pub struct Builder<H> {
    /// Handler for incoming requests.
    handler: H,
    /// Bound listeners.
    listeners: Vec<TcpListener>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl<H> Builder<H>
where
    H: Handler,
{
    /// Creates a server builder.
    ///
    /// Note that the canonical way to create a [`Server`] is to invoke the
    /// [`Server::new`] method, which binds a single address and listens.
    pub fn new(handler: H) -> Self {
        Self { handler, listeners: Vec::new() }
    }

    /// Binds the given socket address.
    ///
    /// If the address is busy, an OS-assigned ephemeral port on the same
    /// interface is bound instead, so a second server instance can always
    /// start. The effective address is available through
    /// [`Server::local_addr`] after listening and should be reported to the
    /// user, as it's the one clients must connect to.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use swite_serve::handler::NotFound;
    /// use swite_serve::server::Builder;
    ///
    /// // Create server builder and bind address
    /// let builder = Builder::new(NotFound)
    ///     .bind("127.0.0.1:3000")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn bind<A>(mut self, addr: A) -> Result<Self>
    where
        A: ToSocketAddrs,
    {
        // The underlying system call might return the same socket address
        // multiple times, which is why we need to deduplicate them
        let mut addrs: Vec<SocketAddr> = Vec::new();
        for addr in addr.to_socket_addrs()? {
            if !addrs.contains(&addr) {
                addrs.push(addr);
            }
        }

        // Bind each address, falling back to an ephemeral port when busy
        for mut addr in addrs {
            let listener = match TcpListener::bind(addr) {
                Ok(listener) => listener,
                Err(err) if err.kind() == ErrorKind::AddrInUse => {
                    addr.set_port(0);
                    TcpListener::bind(addr)?
                }
                Err(err) => return Err(err.into()),
            };
            self.listeners.push(listener);
        }
        Ok(self)
    }

    /// Creates the server from the bound listeners.
    pub fn listen(self) -> Result<Server<H>> {
        if self.listeners.is_empty() {
            return Err(Error::NoAddress);
        }

        // Create a new poller and register all listeners for event
        // notifications, then create and return the server
        let poller = Poller::new()?;
        let mut acceptors = Vec::with_capacity(self.listeners.len());
        for (n, mut listener) in self.listeners.into_iter().enumerate() {
            poller.register(&mut listener, Token(n), Interest::READABLE)?;
            acceptors.push(listener);
        }

        Ok(Server {
            handler: self.handler,
            events: poller,
            acceptors,
            connections: Slab::new(),
            subscribers: Slab::new(),
        })
    }
}
