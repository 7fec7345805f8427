// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet trace: one line per packet sent or received.
//!
//! Line format: `HH:MM:SS.us E SRC:PORT DST:PORT TYPE [number [info]]`
//! where `E` is `s` (send), `S` (resend), `r` (receive) or `R` (duplicate
//! receive). ACK and DAT print number and info, FIN and SYN number only,
//! RST neither.
//!
//! The trace handle is injected into the engines instead of living in a
//! process global, so tests can capture or silence it. It is a pure sink;
//! protocol state never depends on it.

use crate::protocol::Packet;
use chrono::Local;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Packet trace event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Send,
    Resend,
    Receive,
    Duplicate,
}

impl TraceEvent {
    fn code(self) -> char {
        match self {
            Self::Send => 's',
            Self::Resend => 'S',
            Self::Receive => 'r',
            Self::Duplicate => 'R',
        }
    }
}

/// Line-atomic packet trace sink.
pub struct Trace {
    out: Option<Mutex<Box<dyn Write + Send>>>,
}

impl Trace {
    /// Trace to standard output (the CLI default).
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            out: Some(Mutex::new(Box::new(std::io::stdout()))),
        }
    }

    /// Discard all trace lines.
    #[must_use]
    pub fn sink() -> Self {
        Self { out: None }
    }

    /// Trace into a shared buffer, for assertions on emitted lines.
    #[must_use]
    pub fn capture() -> (Self, TraceCapture) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let trace = Self {
            out: Some(Mutex::new(Box::new(CaptureWriter(Arc::clone(&buffer))))),
        };
        (trace, TraceCapture(buffer))
    }

    /// Emit one trace line for `packet` moving from `src` to `dst`.
    pub fn packet(&self, event: TraceEvent, src: SocketAddr, dst: SocketAddr, packet: &Packet<'_>) {
        let Some(out) = &self.out else { return };

        let mut line = format!(
            "{} {} {} {} {}",
            Local::now().format("%H:%M:%S%.6f"),
            event.code(),
            src,
            dst,
            packet.kind().label()
        );
        if let Some(number) = packet.number() {
            line.push_str(&format!(" {}", number));
        }
        if let Some(info) = packet.info() {
            line.push_str(&format!(" {}", info));
        }
        line.push('\n');

        // One write per line keeps interleaved output whole.
        match out.lock() {
            Ok(mut writer) => {
                if let Err(err) = writer.write_all(line.as_bytes()) {
                    log::debug!("[trace] dropped line: {}", err);
                }
            }
            Err(_) => log::debug!("[trace] sink mutex poisoned, line dropped"),
        }
    }
}

/// Handle onto a [`Trace::capture`] buffer.
#[derive(Clone)]
pub struct TraceCapture(Arc<Mutex<Vec<u8>>>);

impl TraceCapture {
    /// Everything traced so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(buffer) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(_) => String::new(),
        }
    }
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut buffer) = self.0.lock() {
            buffer.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
