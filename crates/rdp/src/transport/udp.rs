// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP socket wrapper for single-connection blocking use.
//!
//! Exposes the three substrate operations the engines drive: `send_to`,
//! `recv_from`, and `wait_readable(timeout)`. One socket, one owning thread
//! of control; suspension happens only inside the poll.

use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

const SOCKET_TOKEN: Token = Token(0);

/// Bound, non-blocking UDP socket plus its readiness poll.
pub struct RdpSocket {
    socket: mio::net::UdpSocket,
    poll: Poll,
    events: Events,
    local: SocketAddr,
}

impl RdpSocket {
    /// Create and bind a datagram socket, registered for readability.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;

        let std_socket: std::net::UdpSocket = socket.into();
        std_socket.set_nonblocking(true)?;
        let local = std_socket.local_addr()?;
        let mut socket = mio::net::UdpSocket::from_std(std_socket);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut socket, SOCKET_TOKEN, Interest::READABLE)?;
        log::debug!("[udp] bound {}", local);

        Ok(Self {
            socket,
            poll,
            events: Events::with_capacity(4),
            local,
        })
    }

    /// Address the socket is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Send one datagram to `peer`.
    ///
    /// A full send buffer drops the datagram; the substrate is lossy and
    /// the retransmission machinery recovers.
    pub fn send_to(&self, datagram: &[u8], peer: SocketAddr) -> io::Result<usize> {
        match self.socket.send_to(datagram, peer) {
            Ok(sent) => Ok(sent),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                log::debug!("[udp] send buffer full, datagram to {} dropped", peer);
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }

    /// Non-blocking receive; `None` when nothing is queued.
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok(pair) => Ok(Some(pair)),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Block until the socket is readable or `timeout` elapses.
    ///
    /// `None` blocks indefinitely. Interrupted polls read as not-readable;
    /// callers that still hold deadline budget poll again.
    pub fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        self.events.clear();
        if let Err(err) = self.poll.poll(&mut self.events, timeout) {
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(self.events.iter().any(|event| event.is_readable()))
    }

    /// Receive one datagram, waiting up to `timeout` for it.
    ///
    /// Tries the queue first so readiness edges are never lost, then polls
    /// against a fixed deadline. `Ok(None)` means the wait expired.
    pub fn recv_within(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> io::Result<Option<(usize, SocketAddr)>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(pair) = self.recv_from(buf)? {
                return Ok(Some(pair));
            }
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            self.wait_readable(remaining)?;
        }
    }
}
