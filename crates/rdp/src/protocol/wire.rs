// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codec: ASCII header serialization and parsing.
//!
//! Every packet is one datagram: `Key: value` header lines, a `"\n\n"`
//! separator, then the DAT payload if any. Parsing tokenizes the header on
//! space, tab, newline and colon, consumes `(name, value)` pairs against a
//! case-insensitively sorted field table, and validates the observed field
//! set against the canonical set for the packet's type.
//!
//! Receivers treat every [`WireError`] as a single "invalid packet" signal
//! and drop the datagram without touching connection state.

use crate::config::MAGIC;
use crate::protocol::packet::{Packet, PacketKind};
use std::cmp::Ordering;
use std::io::{self, Write};

/// Header/payload separator.
const SEPARATOR: &[u8] = b"\n\n";

/// Parse failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// No `"\n\n"` in the datagram.
    MissingSeparator,
    /// Header field name outside the six-entry table.
    UnknownField,
    /// Field name with no following value token.
    TruncatedPair,
    /// Magic value other than the protocol literal.
    BadMagic,
    /// Type label outside the five packet kinds.
    UnknownType,
    /// Numeric field that is not a decimal u32.
    BadNumber,
    /// Observed field set differs from the type's canonical set.
    FieldSetMismatch,
    /// DAT payload region length disagrees with the `Payload` field.
    PayloadMismatch,
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::MissingSeparator => "missing header separator",
            Self::UnknownField => "unknown header field",
            Self::TruncatedPair => "truncated field pair",
            Self::BadMagic => "bad magic",
            Self::UnknownType => "unknown packet type",
            Self::BadNumber => "malformed numeric field",
            Self::FieldSetMismatch => "field set mismatch",
            Self::PayloadMismatch => "payload length mismatch",
        };
        write!(f, "invalid packet: {}", reason)
    }
}

impl std::error::Error for WireError {}

// ============================================================================
// Field table
// ============================================================================

/// Header fields, ordered by case-insensitive name for binary search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Acknowledgement,
    Magic,
    Payload,
    Sequence,
    Type,
    Window,
}

const FIELD_NAMES: [(&str, Field); 6] = [
    ("acknowledgement", Field::Acknowledgement),
    ("magic", Field::Magic),
    ("payload", Field::Payload),
    ("sequence", Field::Sequence),
    ("type", Field::Type),
    ("window", Field::Window),
];

impl Field {
    fn lookup(name: &[u8]) -> Option<Self> {
        FIELD_NAMES
            .binary_search_by(|(candidate, _)| cmp_ignore_case(candidate.as_bytes(), name))
            .ok()
            .map(|idx| FIELD_NAMES[idx].1)
    }

    /// Bit in the observed-field mask, by table position.
    fn bit(self) -> u8 {
        match self {
            Self::Acknowledgement => 0x01,
            Self::Magic => 0x02,
            Self::Payload => 0x04,
            Self::Sequence => 0x08,
            Self::Type => 0x10,
            Self::Window => 0x20,
        }
    }
}

/// Marker bit for a non-empty payload region.
const HAS_DATA: u8 = 0x40;

/// Canonical field set per kind. DAT expects the payload marker exactly when
/// its `Payload` field is non-zero.
fn canonical_mask(kind: PacketKind, payload_len: u32) -> u8 {
    let base = Field::Magic.bit() | Field::Type.bit();
    match kind {
        PacketKind::Ack => base | Field::Acknowledgement.bit() | Field::Window.bit(),
        PacketKind::Dat => {
            let data = if payload_len > 0 { HAS_DATA } else { 0 };
            base | Field::Sequence.bit() | Field::Payload.bit() | data
        }
        PacketKind::Fin | PacketKind::Syn => base | Field::Sequence.bit(),
        PacketKind::Rst => base,
    }
}

/// strcasecmp-style ordering over raw bytes.
pub(crate) fn cmp_ignore_case(a: &[u8], b: &[u8]) -> Ordering {
    let lower = |byte: &u8| byte.to_ascii_lowercase();
    a.iter().map(lower).cmp(b.iter().map(lower))
}

// ============================================================================
// Parsing
// ============================================================================

/// Raw field values accumulated while consuming header pairs.
#[derive(Default)]
struct RawFields {
    kind: Option<PacketKind>,
    number: Option<u32>,
    acknowledgement: Option<u32>,
    payload_len: Option<u32>,
    window: Option<u32>,
}

/// Parse one datagram into a [`Packet`] borrowing its payload bytes.
pub fn parse(datagram: &[u8]) -> Result<Packet<'_>, WireError> {
    let sep = datagram
        .windows(SEPARATOR.len())
        .position(|w| w == SEPARATOR)
        .ok_or(WireError::MissingSeparator)?;
    let header = &datagram[..sep];
    let payload = &datagram[sep + SEPARATOR.len()..];

    let mut observed = if payload.is_empty() { 0 } else { HAS_DATA };
    let mut raw = RawFields::default();

    let mut tokens = header
        .split(|&b| matches!(b, b' ' | b'\t' | b'\n' | b':'))
        .filter(|t| !t.is_empty());

    while let Some(name) = tokens.next() {
        let field = Field::lookup(name).ok_or(WireError::UnknownField)?;
        let value = tokens.next().ok_or(WireError::TruncatedPair)?;
        interpret(field, value, &mut raw)?;
        observed |= field.bit();
    }

    let kind = raw.kind.ok_or(WireError::FieldSetMismatch)?;
    if canonical_mask(kind, raw.payload_len.unwrap_or(0)) != observed {
        return Err(WireError::FieldSetMismatch);
    }

    match kind {
        PacketKind::Ack => Ok(Packet::Ack {
            acknowledgement: raw.acknowledgement.ok_or(WireError::FieldSetMismatch)?,
            window: raw.window.ok_or(WireError::FieldSetMismatch)?,
        }),
        PacketKind::Dat => {
            let declared = raw.payload_len.ok_or(WireError::FieldSetMismatch)?;
            if payload.len() != declared as usize {
                return Err(WireError::PayloadMismatch);
            }
            Ok(Packet::Dat {
                sequence: raw.number.ok_or(WireError::FieldSetMismatch)?,
                payload,
            })
        }
        PacketKind::Fin => Ok(Packet::Fin {
            sequence: raw.number.ok_or(WireError::FieldSetMismatch)?,
        }),
        PacketKind::Rst => Ok(Packet::Rst),
        PacketKind::Syn => Ok(Packet::Syn {
            sequence: raw.number.ok_or(WireError::FieldSetMismatch)?,
        }),
    }
}

/// Field-specific value interpreter.
fn interpret(field: Field, value: &[u8], raw: &mut RawFields) -> Result<(), WireError> {
    match field {
        Field::Magic => {
            if !value.eq_ignore_ascii_case(MAGIC.as_bytes()) {
                return Err(WireError::BadMagic);
            }
        }
        Field::Type => {
            raw.kind = Some(PacketKind::from_label(value).ok_or(WireError::UnknownType)?);
        }
        Field::Acknowledgement => raw.acknowledgement = Some(parse_u32(value)?),
        Field::Payload => raw.payload_len = Some(parse_u32(value)?),
        Field::Sequence => raw.number = Some(parse_u32(value)?),
        Field::Window => raw.window = Some(parse_u32(value)?),
    }
    Ok(())
}

fn parse_u32(value: &[u8]) -> Result<u32, WireError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or(WireError::BadNumber)
}

// ============================================================================
// Serialization
// ============================================================================

/// Render `packet` into `buf`, returning the datagram length.
///
/// Byte-deterministic: integer fields print in decimal without leading
/// zeros. Errors only if `buf` cannot hold the rendered datagram.
pub fn encode_into(packet: &Packet<'_>, buf: &mut [u8]) -> io::Result<usize> {
    let capacity = buf.len();
    let mut cursor = &mut buf[..];

    match packet {
        Packet::Ack { acknowledgement, window } => write!(
            cursor,
            "Magic: {}\nType: ACK\nAcknowledgement: {}\nWindow: {}\n\n",
            MAGIC, acknowledgement, window
        )?,
        Packet::Dat { sequence, payload } => {
            write!(
                cursor,
                "Magic: {}\nType: DAT\nSequence: {}\nPayload: {}\n\n",
                MAGIC,
                sequence,
                payload.len()
            )?;
            cursor.write_all(payload)?;
        }
        Packet::Fin { sequence } => {
            write!(cursor, "Magic: {}\nType: FIN\nSequence: {}\n\n", MAGIC, sequence)?
        }
        Packet::Rst => write!(cursor, "Magic: {}\nType: RST\n\n", MAGIC)?,
        Packet::Syn { sequence } => {
            write!(cursor, "Magic: {}\nType: SYN\nSequence: {}\n\n", MAGIC, sequence)?
        }
    }

    Ok(capacity - cursor.len())
}
