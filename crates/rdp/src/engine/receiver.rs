// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Passive-side engine: accept and in-order delivery.
//!
//! The receiver keeps no out-of-order buffer. A segment is delivered only
//! when its sequence equals the next expected byte; everything else is
//! counted and answered with a cumulative ACK restating the last in-order
//! position, which is what drives the sender's retransmission.

use crate::config::{BUF_SIZE, MAX_PAYLOAD};
use crate::conn::Connection;
use crate::error::{RdpError, Result};
use crate::protocol::{self, Packet};
use crate::trace::{Trace, TraceEvent};
use crate::transport::RdpSocket;

/// Outcome of one [`Receiver::receive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveStatus {
    /// Buffer filled to within one segment of capacity; flush and call again.
    Open,
    /// FIN handled and acknowledged; the connection is done.
    Closed,
    /// RST received; the connection is torn down.
    Reset,
}

/// Passive side of one connection.
pub struct Receiver {
    socket: RdpSocket,
    conn: Connection,
    trace: Trace,
}

impl Receiver {
    /// Wait for a connection request on the bound socket.
    ///
    /// A SYN initializes the connection (`number = seq + 1`, window = 1024)
    /// and is answered with an ACK. Anything else fails `UnexpectedPacket`
    /// with no reply beyond the statistics bump.
    pub fn accept(mut socket: RdpSocket, trace: Trace) -> Result<Self> {
        let local = socket.local_addr();
        let mut scratch = [0u8; BUF_SIZE];

        let Some((len, peer)) = socket.recv_within(&mut scratch, None)? else {
            return Err(RdpError::UnexpectedPacket);
        };
        let mut conn = Connection::new(local, peer);

        let pkt = match protocol::parse(&scratch[..len]) {
            Ok(pkt) => pkt,
            Err(err) => {
                log::debug!("[receiver] first datagram unparseable: {}", err);
                return Err(RdpError::UnexpectedPacket);
            }
        };
        trace.packet(TraceEvent::Receive, peer, local, &pkt);

        match pkt {
            Packet::Syn { sequence } => {
                conn.number = sequence + 1;
                conn.window = BUF_SIZE as u32;
                let mut receiver = Self { socket, conn, trace };
                receiver.acknowledge(receiver.conn.number, TraceEvent::Send)?;
                Ok(receiver)
            }
            other => {
                match other {
                    Packet::Fin { .. } => conn.stats_mut().fin += 1,
                    Packet::Rst => conn.stats_mut().rst_received += 1,
                    _ => {}
                }
                Err(RdpError::UnexpectedPacket)
            }
        }
    }

    /// Deliver in-order bytes into `buf`.
    ///
    /// Runs while at least one full segment still fits, so a capacity of
    /// [`MAX_PAYLOAD`] or less returns `Open` with zero bytes immediately.
    /// Returns the status and the byte count delivered this call; the
    /// caller flushes `buf` and calls again while `Open`.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<(ReceiveStatus, usize)> {
        let local = self.conn.local();
        let peer = self.conn.peer();
        let mut delivered = 0usize;
        let mut scratch = [0u8; BUF_SIZE];

        self.conn.window = buf.len() as u32;

        while buf.len() - delivered > MAX_PAYLOAD {
            let Some((len, _)) = self.socket.recv_within(&mut scratch, None)? else {
                continue;
            };
            let pkt = match protocol::parse(&scratch[..len]) {
                Ok(pkt) => pkt,
                Err(err) => {
                    log::debug!("[receiver] dropping invalid datagram: {}", err);
                    continue;
                }
            };

            // A number below the next expected byte marks a duplicate; its
            // re-ACK is traced as a resend.
            let duplicate = matches!(pkt.number(), Some(number) if number < self.conn.number);
            let (recv_event, ack_event) = if duplicate {
                (TraceEvent::Duplicate, TraceEvent::Resend)
            } else {
                (TraceEvent::Receive, TraceEvent::Send)
            };
            self.trace.packet(recv_event, peer, local, &pkt);

            match pkt {
                Packet::Dat { sequence, payload } => {
                    if sequence == self.conn.number {
                        let span = payload
                            .len()
                            .min(BUF_SIZE)
                            .min(buf.len() - delivered);
                        buf[delivered..delivered + span].copy_from_slice(&payload[..span]);
                        delivered += span;
                        self.conn.number += span as u32;
                        self.conn.window -= span as u32;
                        let stats = self.conn.stats_mut();
                        stats.unique_data_bytes += payload.len() as u64;
                        stats.unique_data_packets += 1;
                    }
                    let stats = self.conn.stats_mut();
                    stats.total_data_bytes += payload.len() as u64;
                    stats.total_data_packets += 1;
                }
                Packet::Fin { .. } => {
                    self.conn.stats_mut().fin += 1;
                    let acknowledgement = self.conn.number + 1;
                    self.acknowledge(acknowledgement, ack_event)?;
                    self.conn.stats_mut().finalize();
                    return Ok((ReceiveStatus::Closed, delivered));
                }
                Packet::Syn { .. } => {
                    // Handshake retransmit; the state re-ACK below covers it.
                    self.conn.stats_mut().syn += 1;
                }
                Packet::Rst => {
                    self.conn.stats_mut().rst_received += 1;
                    self.conn.stats_mut().finalize();
                    return Ok((ReceiveStatus::Reset, delivered));
                }
                Packet::Ack { .. } => {}
            }

            self.acknowledge(self.conn.number, ack_event)?;
        }

        Ok((ReceiveStatus::Open, delivered))
    }

    /// Connection record, for statistics reporting.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Send `ACK(acknowledgement, window)` to the peer, tracing it.
    fn acknowledge(&mut self, acknowledgement: u32, event: TraceEvent) -> Result<()> {
        let ack = Packet::Ack {
            acknowledgement,
            window: self.conn.window,
        };
        let mut scratch = [0u8; BUF_SIZE];
        let len = protocol::encode_into(&ack, &mut scratch)?;
        self.socket.send_to(&scratch[..len], self.conn.peer())?;
        self.conn.stats_mut().ack += 1;
        self.trace
            .packet(event, self.conn.local(), self.conn.peer(), &ack);
        Ok(())
    }
}
