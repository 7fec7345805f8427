// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-connection state and statistics.
//!
//! A [`Connection`] is owned and mutated by exactly one engine on one thread
//! of control. `number` is the sender's next unacknowledged byte on the
//! active side and the next expected byte on the passive side; `window` is
//! the peer's advertised space (sender) or the local delivery capacity
//! (receiver).

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Which side of the transfer a connection drove, for report wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

/// Per-connection counters.
///
/// "Unique" counts first transmissions/deliveries only; retransmissions and
/// duplicate receipts bump the totals alone.
#[derive(Debug)]
pub struct Stats {
    pub total_data_bytes: u64,
    pub unique_data_bytes: u64,
    pub total_data_packets: u64,
    pub unique_data_packets: u64,
    pub ack: u64,
    pub syn: u64,
    pub fin: u64,
    /// RST packets received from the peer.
    pub rst_received: u64,
    /// RST packets sent to the peer.
    pub rst_sent: u64,
    started: Instant,
    elapsed: Option<Duration>,
}

impl Stats {
    fn new() -> Self {
        Self {
            total_data_bytes: 0,
            unique_data_bytes: 0,
            total_data_packets: 0,
            unique_data_packets: 0,
            ack: 0,
            syn: 0,
            fin: 0,
            rst_received: 0,
            rst_sent: 0,
            started: Instant::now(),
            elapsed: None,
        }
    }

    /// Freeze the elapsed duration. First call wins; later calls keep the
    /// earlier measurement.
    pub(crate) fn finalize(&mut self) {
        if self.elapsed.is_none() {
            self.elapsed = Some(self.started.elapsed());
        }
    }

    /// Wall-clock lifetime of the connection. Live reading until
    /// finalization, frozen afterwards.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    /// Formatted statistics block for end-of-run reporting.
    #[must_use]
    pub fn report(&self, role: Role) -> String {
        let (this_way, other_way) = match role {
            Role::Sender => ("sent", "received"),
            Role::Receiver => ("received", "sent"),
        };
        // RST counters follow the wording direction, not the storage field.
        let (rst_this_way, rst_other_way) = match role {
            Role::Sender => (self.rst_sent, self.rst_received),
            Role::Receiver => (self.rst_received, self.rst_sent),
        };

        let mut out = String::new();
        out.push_str(&format!(
            "total data bytes {}: {}\n",
            this_way, self.total_data_bytes
        ));
        out.push_str(&format!(
            "unique data bytes {}: {}\n",
            this_way, self.unique_data_bytes
        ));
        out.push_str(&format!(
            "total data packets {}: {}\n",
            this_way, self.total_data_packets
        ));
        out.push_str(&format!(
            "unique data packets {}: {}\n",
            this_way, self.unique_data_packets
        ));
        out.push_str(&format!("SYN packets {}: {}\n", this_way, self.syn));
        out.push_str(&format!("FIN packets {}: {}\n", this_way, self.fin));
        out.push_str(&format!("RST packets {}: {}\n", this_way, rst_this_way));
        out.push_str(&format!("ACK packets {}: {}\n", other_way, self.ack));
        out.push_str(&format!("RST packets {}: {}\n", other_way, rst_other_way));
        out.push_str(&format!(
            "total time duration: {:.3}s\n",
            self.elapsed().as_secs_f64()
        ));
        out
    }
}

/// Mutable state of one connection.
#[derive(Debug)]
pub struct Connection {
    local: SocketAddr,
    peer: SocketAddr,
    stats: Stats,
    /// Next unacknowledged byte (sender) or next expected byte (receiver).
    /// Monotonic non-decreasing for the connection lifetime.
    pub(crate) number: u32,
    /// Peer-advertised window (sender) or local acceptance window (receiver).
    pub(crate) window: u32,
}

impl Connection {
    /// Fresh zeroed connection; timing begins now.
    pub(crate) fn new(local: SocketAddr, peer: SocketAddr) -> Self {
        Self {
            local,
            peer,
            stats: Stats::new(),
            number: 0,
            window: 0,
        }
    }

    #[must_use]
    pub fn local(&self) -> SocketAddr {
        self.local
    }

    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn window(&self) -> u32 {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        Connection::new(
            "127.0.0.1:4000".parse().expect("addr"),
            "127.0.0.1:4001".parse().expect("addr"),
        )
    }

    #[test]
    fn finalize_freezes_elapsed() {
        let mut conn = test_conn();
        conn.stats_mut().finalize();
        let first = conn.stats().elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(conn.stats().elapsed(), first);
    }

    #[test]
    fn report_wording_follows_role() {
        let mut conn = test_conn();
        conn.stats_mut().rst_sent = 1;
        conn.stats_mut().rst_received = 2;
        conn.stats_mut().finalize();

        let sender = conn.stats().report(Role::Sender);
        assert!(sender.contains("total data bytes sent: 0"));
        assert!(sender.contains("RST packets sent: 1"));
        assert!(sender.contains("RST packets received: 2"));
        assert!(sender.contains("ACK packets received: 0"));

        let receiver = conn.stats().report(Role::Receiver);
        assert!(receiver.contains("total data bytes received: 0"));
        assert!(receiver.contains("RST packets received: 2"));
        assert!(receiver.contains("RST packets sent: 1"));
        assert!(receiver.contains("ACK packets sent: 0"));
    }

    #[test]
    fn report_ends_with_duration_line() {
        let mut conn = test_conn();
        conn.stats_mut().finalize();
        let report = conn.stats().report(Role::Sender);
        let last = report.lines().last().expect("non-empty");
        assert!(last.starts_with("total time duration: "));
        assert!(last.ends_with('s'));
    }
}
