// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Active-side engine: connect, send, close.
//!
//! # Protocol flow
//!
//! ```text
//! Sender                                   Receiver
//!   |--- SYN (seq=0) ----------------------->|
//!   |<-- ACK (ack=1, window=1024) -----------|
//!   |--- DAT (seq=1,    pay=959) ----------->|
//!   |--- DAT (seq=960,  pay=959) ---X (lost) |
//!   |<-- ACK (ack=960) ----------------------|  (cumulative)
//!   |--- DAT (seq=960,  pay=959) [resend] -->|
//!   |<-- ACK (ack=1919) ---------------------|
//!   |--- FIN (seq=1919) -------------------->|
//!   |<-- ACK (ack=1920) ---------------------|
//! ```
//!
//! Everything below the sender's `number` is acknowledged; a retransmission
//! round restarts there. Three consecutive silent drain rounds escalate to
//! RST.

use crate::config::{BUF_SIZE, BURST, HANDSHAKE_RTO, MAX_PAYLOAD, MAX_RETRIES, WAIT_RTO};
use crate::conn::Connection;
use crate::error::{RdpError, Result};
use crate::protocol::{self, Packet};
use crate::trace::{Trace, TraceEvent};
use crate::transport::RdpSocket;
use std::net::SocketAddr;

/// Active side of one connection. Owns the socket, the connection record
/// and the trace sink for the connection's lifetime.
pub struct Sender {
    socket: RdpSocket,
    conn: Connection,
    trace: Trace,
}

impl Sender {
    /// Establish a connection to `peer`.
    ///
    /// Sends `SYN(seq=0)` with exponentially backed-off waits of 1, 2 and
    /// 4 seconds. Fails `ConnectionTimeout` after three silent attempts,
    /// `ConnectionReset` on an RST or any unexpected reply.
    pub fn connect(socket: RdpSocket, peer: SocketAddr, trace: Trace) -> Result<Self> {
        let local = socket.local_addr();
        let mut sender = Self {
            socket,
            conn: Connection::new(local, peer),
            trace,
        };
        let mut scratch = [0u8; BUF_SIZE];

        for attempt in 0..MAX_RETRIES {
            let event = if attempt == 0 {
                TraceEvent::Send
            } else {
                TraceEvent::Resend
            };
            sender.emit(&Packet::Syn { sequence: sender.conn.number }, event)?;
            sender.conn.stats_mut().syn += 1;

            let timeout = HANDSHAKE_RTO * (1 << attempt);
            let Some((len, _)) = sender.socket.recv_within(&mut scratch, Some(timeout))? else {
                continue;
            };

            let pkt = match protocol::parse(&scratch[..len]) {
                Ok(pkt) => pkt,
                Err(err) => {
                    log::debug!("[sender] handshake reply unparseable: {}", err);
                    sender.conn.stats_mut().finalize();
                    return Err(RdpError::ConnectionReset);
                }
            };
            sender.trace.packet(TraceEvent::Receive, peer, local, &pkt);

            match pkt {
                Packet::Ack { acknowledgement, window } => {
                    sender.conn.stats_mut().ack += 1;
                    if acknowledgement == sender.conn.number + 1 {
                        sender.conn.number += 1;
                        sender.conn.window = window;
                        return Ok(sender);
                    }
                    sender.reset()?;
                    sender.conn.stats_mut().finalize();
                    return Err(RdpError::ConnectionReset);
                }
                Packet::Rst => {
                    sender.conn.stats_mut().rst_received += 1;
                    sender.conn.stats_mut().finalize();
                    return Err(RdpError::ConnectionReset);
                }
                _ => {
                    sender.reset()?;
                    sender.conn.stats_mut().finalize();
                    return Err(RdpError::ConnectionReset);
                }
            }
        }

        sender.conn.stats_mut().finalize();
        Err(RdpError::ConnectionTimeout)
    }

    /// Transmit `data` reliably. Blocks until every byte is acknowledged.
    ///
    /// Bursts up to [`BURST`] segments within the peer window, then drains
    /// ACKs with 250 ms waits. Cumulative acknowledgements move `number`
    /// forward; a round that yields no datagram at all counts toward the
    /// RST escalation. An empty `data` returns immediately.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        let local = self.conn.local();
        let peer = self.conn.peer();
        let base_seq = self.conn.number;
        let mut highest_sent = self.conn.number - 1;
        let mut sent = 0usize;
        let mut remaining = data.len();
        let mut retries = 0u32;
        let mut scratch = [0u8; BUF_SIZE];

        while remaining > 0 {
            // Transmission round: everything from `number` up, window and
            // burst bound, retransmitting whatever an earlier round already
            // put on the wire.
            let mut budget = (self.conn.window as usize).min(remaining);
            let mut seq = self.conn.number;
            let mut packets = 0;
            while packets < BURST && budget > 0 {
                let pay = budget.min(MAX_PAYLOAD);
                budget -= pay;
                let offset = (seq - base_seq) as usize;
                let dat = Packet::Dat {
                    sequence: seq,
                    payload: &data[offset..offset + pay],
                };

                let event = if seq > highest_sent {
                    highest_sent = seq;
                    let stats = self.conn.stats_mut();
                    stats.unique_data_bytes += pay as u64;
                    stats.unique_data_packets += 1;
                    TraceEvent::Send
                } else {
                    TraceEvent::Resend
                };
                let stats = self.conn.stats_mut();
                stats.total_data_bytes += pay as u64;
                stats.total_data_packets += 1;
                self.emit(&dat, event)?;

                seq += pay as u32;
                packets += 1;
            }
            let burst_end = seq;

            // ACK drain: every received datagram keeps the round alive,
            // valid or not.
            let mut received_any = false;
            loop {
                let Some((len, _)) = self.socket.recv_within(&mut scratch, Some(WAIT_RTO))? else {
                    break;
                };
                received_any = true;

                let pkt = match protocol::parse(&scratch[..len]) {
                    Ok(pkt) => pkt,
                    Err(err) => {
                        log::debug!("[sender] dropping invalid datagram: {}", err);
                        continue;
                    }
                };

                match pkt {
                    Packet::Ack { acknowledgement, window } => {
                        if acknowledgement > burst_end {
                            // Acknowledges bytes never transmitted.
                            log::debug!(
                                "[sender] bogus ack {} past burst end {}",
                                acknowledgement,
                                burst_end
                            );
                            continue;
                        }
                        self.conn.stats_mut().ack += 1;
                        if acknowledgement > self.conn.number {
                            sent += (acknowledgement - self.conn.number) as usize;
                            self.conn.number = acknowledgement;
                            self.conn.window = window;
                            remaining = data.len() - sent;
                            self.trace.packet(TraceEvent::Receive, peer, local, &pkt);
                            if acknowledgement == burst_end {
                                break;
                            }
                        } else {
                            self.trace.packet(TraceEvent::Duplicate, peer, local, &pkt);
                        }
                    }
                    Packet::Rst => {
                        self.conn.stats_mut().rst_received += 1;
                        self.trace.packet(TraceEvent::Receive, peer, local, &pkt);
                        self.conn.stats_mut().finalize();
                        return Err(RdpError::ConnectionReset);
                    }
                    other => {
                        // Not meaningful on the ACK path; trace and move on.
                        self.trace.packet(TraceEvent::Receive, peer, local, &other);
                    }
                }
            }

            if received_any {
                retries = 0;
            } else {
                retries += 1;
                if retries == MAX_RETRIES {
                    self.reset()?;
                    self.conn.stats_mut().finalize();
                    return Err(RdpError::PeerUnresponsive);
                }
            }
        }

        Ok(())
    }

    /// Graceful teardown: `FIN(seq=number)` until `ACK(ack=number+1)`.
    ///
    /// Three attempts with a flat 1 second wait each. An RST fails
    /// `ConnectionReset`; any other reply triggers an RST of our own and
    /// keeps draining. Timing is finalized on every exit path.
    pub fn close(&mut self) -> Result<()> {
        let local = self.conn.local();
        let peer = self.conn.peer();
        let fin = Packet::Fin { sequence: self.conn.number };
        let mut scratch = [0u8; BUF_SIZE];

        for attempt in 0..MAX_RETRIES {
            let event = if attempt == 0 {
                TraceEvent::Send
            } else {
                TraceEvent::Resend
            };
            self.emit(&fin, event)?;
            self.conn.stats_mut().fin += 1;

            loop {
                let Some((len, _)) = self.socket.recv_within(&mut scratch, Some(HANDSHAKE_RTO))?
                else {
                    break;
                };
                let pkt = match protocol::parse(&scratch[..len]) {
                    Ok(pkt) => pkt,
                    Err(err) => {
                        log::debug!("[sender] dropping invalid datagram: {}", err);
                        continue;
                    }
                };

                let event = match pkt.number() {
                    Some(number) if number < self.conn.number + 1 => TraceEvent::Duplicate,
                    _ => TraceEvent::Receive,
                };
                self.trace.packet(event, peer, local, &pkt);

                match pkt {
                    Packet::Ack { acknowledgement, .. } => {
                        self.conn.stats_mut().ack += 1;
                        if acknowledgement == self.conn.number + 1 {
                            self.conn.stats_mut().finalize();
                            return Ok(());
                        }
                    }
                    Packet::Rst => {
                        self.conn.stats_mut().rst_received += 1;
                        self.conn.stats_mut().finalize();
                        return Err(RdpError::ConnectionReset);
                    }
                    _ => self.reset()?,
                }
            }
        }

        self.conn.stats_mut().finalize();
        Err(RdpError::PeerUnresponsive)
    }

    /// Connection record, for statistics reporting.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Serialize and transmit one packet to the peer, tracing it.
    fn emit(&mut self, packet: &Packet<'_>, event: TraceEvent) -> Result<()> {
        let mut scratch = [0u8; BUF_SIZE];
        let len = protocol::encode_into(packet, &mut scratch)?;
        self.socket.send_to(&scratch[..len], self.conn.peer())?;
        self.trace
            .packet(event, self.conn.local(), self.conn.peer(), packet);
        Ok(())
    }

    /// Abortive teardown signal to the peer.
    fn reset(&mut self) -> Result<()> {
        self.emit(&Packet::Rst, TraceEvent::Send)?;
        self.conn.stats_mut().rst_sent += 1;
        Ok(())
    }
}
