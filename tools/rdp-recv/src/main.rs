// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rdp-recv - receive a file over RDP.
//!
//! Binds the local endpoint, accepts one connection, then loops receive
//! calls into the output file until the peer closes or resets.

use clap::Parser;
use colored::Colorize;
use rdp::{RdpError, RdpSocket, ReceiveStatus, Receiver, Role, Trace};
use std::fs::File;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Delivery buffer flushed to the output file between receive calls.
const BUFFER_SIZE: usize = 65536;

/// Receive a file over RDP
#[derive(Parser, Debug)]
#[command(name = "rdp-recv")]
#[command(version)]
#[command(about = "Receive a reliable UDP file transfer")]
struct Args {
    /// Local address to bind
    receiver_ip: IpAddr,

    /// Local port to bind
    receiver_port: u16,

    /// Output file
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
    let mut out = File::create(&args.file)?;

    let socket = RdpSocket::bind(SocketAddr::new(args.receiver_ip, args.receiver_port))?;
    let mut receiver = Receiver::accept(socket, Trace::stdout())?;

    let mut buf = vec![0u8; BUFFER_SIZE];
    let status = loop {
        let (status, delivered) = receiver.receive(&mut buf)?;
        out.write_all(&buf[..delivered])?;
        if status != ReceiveStatus::Open {
            break status;
        }
    };

    print!("{}", receiver.connection().stats().report(Role::Receiver));
    if status == ReceiveStatus::Reset {
        return Err(RdpError::ConnectionReset.into());
    }
    Ok(())
}
