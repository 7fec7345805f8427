// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol constants - single source of truth.
//!
//! Every tunable of the wire format and the retransmission machinery lives
//! here. **Never hardcode these elsewhere!**

use std::time::Duration;

/// Magic string identifying the protocol family.
///
/// Compared case-insensitively on parse. Identification only, not
/// authentication.
pub const MAGIC: &str = "cscs361p2";

/// Maximum datagram size in bytes, header plus payload.
///
/// Also the size of the per-call scratch buffer and the window a passive
/// endpoint advertises right after the handshake.
pub const BUF_SIZE: usize = 1024;

/// Maximum DAT payload in bytes.
///
/// Chosen so that the longest possible header plus payload stays under
/// [`BUF_SIZE`].
pub const MAX_PAYLOAD: usize = 959;

/// DAT segments emitted per transmission round before draining ACKs.
pub const BURST: usize = 100;

/// Consecutive silent rounds (or handshake attempts) before giving up.
pub const MAX_RETRIES: u32 = 3;

/// Base retransmission timeout for SYN and FIN exchanges.
///
/// The SYN schedule doubles this per attempt; the FIN schedule uses it flat.
pub const HANDSHAKE_RTO: Duration = Duration::from_secs(1);

/// Readability wait inside a send-round ACK drain.
pub const WAIT_RTO: Duration = Duration::from_millis(250);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_payload_fits_under_datagram_ceiling() {
        // Longest DAT header: both u32 fields at their widest.
        let header = format!(
            "Magic: {}\nType: DAT\nSequence: {}\nPayload: {}\n\n",
            MAGIC,
            u32::MAX,
            u32::MAX
        );
        assert!(header.len() + MAX_PAYLOAD <= BUF_SIZE);
    }

    #[test]
    fn handshake_backoff_stays_in_range() {
        let last = HANDSHAKE_RTO * (1 << (MAX_RETRIES - 1));
        assert_eq!(last, Duration::from_secs(4));
    }
}
