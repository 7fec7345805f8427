// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// End-to-end transfers over loopback UDP: one thread per endpoint, each
// driving its own engine, exactly like the CLI front-ends do.

use rdp::{RdpSocket, ReceiveStatus, Receiver, Sender, Trace};
use std::net::SocketAddr;
use std::thread;

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().expect("addr")
}

/// Accept one connection and drain it until FIN or RST.
fn run_receiver(socket: RdpSocket) -> thread::JoinHandle<(ReceiveStatus, Vec<u8>, Receiver)> {
    thread::spawn(move || {
        let mut receiver = Receiver::accept(socket, Trace::sink()).expect("accept");
        let mut collected = Vec::new();
        let mut buf = vec![0u8; 65536];
        loop {
            let (status, delivered) = receiver.receive(&mut buf).expect("receive");
            collected.extend_from_slice(&buf[..delivered]);
            if status != ReceiveStatus::Open {
                return (status, collected, receiver);
            }
        }
    })
}

#[test]
fn three_kilobyte_transfer_delivers_identically() {
    let receiver_socket = RdpSocket::bind(loopback()).expect("bind receiver");
    let receiver_addr = receiver_socket.local_addr();
    let receiver_thread = run_receiver(receiver_socket);

    let payload: Vec<u8> = (0..3000).map(|_| fastrand::u8(..)).collect();

    let sender_socket = RdpSocket::bind(loopback()).expect("bind sender");
    let mut sender =
        Sender::connect(sender_socket, receiver_addr, Trace::sink()).expect("connect");
    sender.send(&payload).expect("send");
    sender.close().expect("close");

    let (status, collected, receiver) = receiver_thread.join().expect("receiver thread");
    assert_eq!(status, ReceiveStatus::Closed);
    assert_eq!(collected, payload);

    let tx = sender.connection().stats();
    // Handshake window is 1024, so the first round carries 959 + 65 bytes
    // and the rest follows under the receiver's wide-open window; at least
    // four segments for 3000 bytes either way.
    assert!(tx.unique_data_packets >= 4);
    assert!(tx.unique_data_bytes <= 3000);
    assert!(tx.total_data_bytes >= 3000);
    assert!(tx.total_data_bytes >= tx.unique_data_bytes);
    assert!(tx.total_data_packets >= tx.unique_data_packets);
    assert!(tx.ack >= 2);
    assert!(tx.syn >= 1);
    assert!(tx.fin >= 1);
    assert_eq!(tx.rst_sent, 0);

    let rx = receiver.connection().stats();
    // Every payload byte lands exactly once.
    assert_eq!(rx.unique_data_bytes, 3000);
    assert!(rx.unique_data_packets >= 4);
    assert!(rx.total_data_bytes >= rx.unique_data_bytes);
    assert!(rx.total_data_packets >= rx.unique_data_packets);
    assert_eq!(rx.fin, 1);
}

#[test]
fn zero_length_send_emits_no_data() {
    let receiver_socket = RdpSocket::bind(loopback()).expect("bind receiver");
    let receiver_addr = receiver_socket.local_addr();
    let receiver_thread = run_receiver(receiver_socket);

    let sender_socket = RdpSocket::bind(loopback()).expect("bind sender");
    let mut sender =
        Sender::connect(sender_socket, receiver_addr, Trace::sink()).expect("connect");
    sender.send(&[]).expect("empty send");
    sender.close().expect("close");

    let (status, collected, receiver) = receiver_thread.join().expect("receiver thread");
    assert_eq!(status, ReceiveStatus::Closed);
    assert!(collected.is_empty());

    assert_eq!(sender.connection().stats().unique_data_packets, 0);
    assert_eq!(sender.connection().stats().total_data_bytes, 0);
    assert_eq!(receiver.connection().stats().total_data_packets, 0);
}

#[test]
fn number_tracks_delivered_bytes() {
    let receiver_socket = RdpSocket::bind(loopback()).expect("bind receiver");
    let receiver_addr = receiver_socket.local_addr();
    let receiver_thread = run_receiver(receiver_socket);

    let payload = vec![0x5Au8; 400];

    let sender_socket = RdpSocket::bind(loopback()).expect("bind sender");
    let mut sender =
        Sender::connect(sender_socket, receiver_addr, Trace::sink()).expect("connect");
    assert_eq!(sender.connection().number(), 1);
    sender.send(&payload).expect("send");
    assert_eq!(sender.connection().number(), 401);
    sender.close().expect("close");

    let (_, collected, receiver) = receiver_thread.join().expect("receiver thread");
    assert_eq!(collected, payload);
    // Initial sequence 0: next expected byte sits one past the data.
    assert_eq!(receiver.connection().number(), 401);
}
