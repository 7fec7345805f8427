// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # RDP - Reliable Datagram Protocol
//!
//! A minimal reliable, ordered, connection-oriented byte-stream service on
//! top of best-effort UDP: handshake, cumulative acknowledgements,
//! timeout-driven retransmission and receiver-advertised flow control, with
//! an ASCII packet header format.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rdp::{RdpSocket, Role, Sender, Trace};
//!
//! fn main() -> rdp::Result<()> {
//!     // Active side
//!     let socket = RdpSocket::bind("127.0.0.1:4000".parse().unwrap())?;
//!     let mut sender = Sender::connect(
//!         socket,
//!         "127.0.0.1:4001".parse().unwrap(),
//!         Trace::stdout(),
//!     )?;
//!     sender.send(b"payload bytes")?;
//!     sender.close()?;
//!     print!("{}", sender.connection().stats().report(Role::Sender));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                     Application bytes                        |
//! +--------------------------------------------------------------+
//! |  Engines: Sender (connect/send/close), Receiver (accept/     |
//! |  receive) - burst, drain, cumulative ACK, RST escalation     |
//! +--------------------------------------------------------------+
//! |  Codec: ASCII header parse/serialize, per-type field sets    |
//! +--------------------------------------------------------------+
//! |  Transport: bound UDP socket, bounded readiness wait         |
//! +--------------------------------------------------------------+
//! ```
//!
//! One connection per endpoint pair, one thread of control per connection.
//! There is no congestion control and no out-of-order buffering: segments
//! arriving past the next expected byte are dropped and re-cum-ACK'd.

/// Protocol constants (magic, sizes, timers).
pub mod config;
/// Per-connection state and statistics.
pub mod conn;
/// Connection engines (sender and receiver).
pub mod engine;
/// Caller-visible error taxonomy.
pub mod error;
/// Packet model and wire codec.
pub mod protocol;
/// Packet trace sink.
pub mod trace;
/// Datagram substrate.
pub mod transport;

pub use conn::{Connection, Role, Stats};
pub use engine::{ReceiveStatus, Receiver, Sender};
pub use error::{RdpError, Result};
pub use protocol::{Packet, PacketKind};
pub use trace::{Trace, TraceCapture, TraceEvent};
pub use transport::RdpSocket;
