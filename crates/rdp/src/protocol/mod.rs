// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet model and wire codec.
//!
//! [`packet`] defines the tagged packet variants; [`wire`] turns them into
//! ASCII-header datagrams and back, validating the per-type field set.

pub mod packet;
pub mod wire;

pub use packet::{Packet, PacketKind};
pub use wire::{encode_into, parse, WireError};
