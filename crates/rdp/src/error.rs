// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Caller-visible error taxonomy.
//!
//! Parse failures are deliberately absent: an invalid datagram is dropped by
//! the engine that read it and never surfaces past the codec boundary.

use std::io;

/// Errors surfaced by the connection engines.
#[derive(Debug)]
pub enum RdpError {
    /// No response to the initial SYN after all backed-off attempts.
    ConnectionTimeout,
    /// RST received, or an unexpected packet seen during the handshake.
    ConnectionReset,
    /// Retransmission rounds exhausted without a single datagram from the
    /// peer; an RST has been sent before this is returned.
    PeerUnresponsive,
    /// Passive accept read something other than a SYN.
    UnexpectedPacket,
    /// Substrate failure (socket create, bind, send, receive, poll).
    Io(io::Error),
}

impl std::fmt::Display for RdpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionTimeout => write!(f, "connection timeout"),
            Self::ConnectionReset => write!(f, "connection reset"),
            Self::PeerUnresponsive => write!(f, "host not responsive"),
            Self::UnexpectedPacket => write!(f, "expected SYN packet"),
            Self::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for RdpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RdpError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, RdpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_diagnostics() {
        assert_eq!(RdpError::ConnectionTimeout.to_string(), "connection timeout");
        assert_eq!(RdpError::PeerUnresponsive.to_string(), "host not responsive");
    }

    #[test]
    fn io_errors_convert() {
        let err: RdpError = io::Error::new(io::ErrorKind::AddrInUse, "bind").into();
        assert!(matches!(err, RdpError::Io(_)));
    }
}
