// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rdp-send - transmit a file over RDP.
//!
//! Binds the local endpoint, memory-maps the input file, then runs
//! connect / send / close and prints the connection statistics.

use clap::Parser;
use colored::Colorize;
use memmap2::Mmap;
use rdp::{RdpSocket, Role, Sender, Trace};
use std::fs::File;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Send a file over RDP
#[derive(Parser, Debug)]
#[command(name = "rdp-send")]
#[command(version)]
#[command(about = "Transmit a file reliably over UDP")]
struct Args {
    /// Local address to bind
    sender_ip: IpAddr,

    /// Local port to bind
    sender_port: u16,

    /// Receiver address
    receiver_ip: IpAddr,

    /// Receiver port
    receiver_port: u16,

    /// File to transmit
    file: PathBuf,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(err) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(&args.file)?;
    // SAFETY: mapped read-only; the file is not truncated or written while
    // the mapping is alive.
    let data = unsafe { Mmap::map(&file)? };

    let socket = RdpSocket::bind(SocketAddr::new(args.sender_ip, args.sender_port))?;
    let peer = SocketAddr::new(args.receiver_ip, args.receiver_port);
    let mut sender = Sender::connect(socket, peer, Trace::stdout())?;

    let outcome = sender.send(&data).and_then(|()| sender.close());

    // Statistics print on success and failure alike.
    print!("{}", sender.connection().stats().report(Role::Sender));
    outcome?;
    Ok(())
}
