#![cfg(unix)]

use std::os::unix::net::UnixStream;
use std::thread;

use bytes::Bytes;
use dcep_channel::{Channel, ChannelConfig, ChannelEvent};
use dcep_wire::ChannelType;

fn wait_for_open<R: std::io::Read, W: std::io::Write>(channel: &mut Channel<R, W>) {
    loop {
        match channel.poll_event() {
            Some(ChannelEvent::Open) => return,
            Some(ChannelEvent::Error(err)) => panic!("channel error before open: {err}"),
            Some(_) => continue,
            None => panic!("source ended before handshake completed"),
        }
    }
}

fn wait_for_data<R: std::io::Read, W: std::io::Write>(channel: &mut Channel<R, W>) -> Bytes {
    loop {
        match channel.poll_event() {
            Some(ChannelEvent::Data(data)) => return data,
            Some(ChannelEvent::Error(err)) => panic!("channel error while waiting: {err}"),
            Some(_) => continue,
            None => panic!("source ended before payload arrived"),
        }
    }
}

#[test]
fn open_ack_exchange_between_two_channels() {
    let (left, right) = UnixStream::pair().unwrap();

    // Negotiated side: waits for OPEN, answers with ACK.
    let server = thread::spawn(move || {
        let input = left.try_clone().unwrap();
        let mut channel = Channel::new(
            input,
            left,
            ChannelConfig {
                negotiated: true,
                ..ChannelConfig::default()
            },
        )
        .unwrap();

        wait_for_open(&mut channel);

        // Parameters come from the peer's OPEN.
        assert_eq!(channel.label(), b"console");
        assert_eq!(channel.protocol(), b"rpc");
        assert_eq!(channel.channel_type(), ChannelType::Reliable);
        assert_eq!(channel.priority(), 256);
        assert!(channel.ordered());

        let data = wait_for_data(&mut channel);
        assert_eq!(data.as_ref(), b"ping");

        channel.write(Bytes::from_static(b"pong")).unwrap();
        channel
    });

    // Non-negotiated side: sends OPEN, waits for ACK.
    let input = right.try_clone().unwrap();
    let mut channel = Channel::new(
        input,
        right,
        ChannelConfig {
            label: Bytes::from_static(b"console"),
            protocol: Bytes::from_static(b"rpc"),
            priority: 256,
            ..ChannelConfig::default()
        },
    )
    .unwrap();

    wait_for_open(&mut channel);
    assert!(channel.is_ready());

    channel.write(Bytes::from_static(b"ping")).unwrap();
    let data = wait_for_data(&mut channel);
    assert_eq!(data.as_ref(), b"pong");

    let server_channel = server.join().unwrap();
    drop(server_channel);

    // The peer is gone; inbound EOF plus sink completion closes the channel.
    assert!(channel.poll_event().is_none());
    channel.sink_closed();
    assert!(matches!(channel.poll_event(), Some(ChannelEvent::Close)));
    assert!(channel.is_closed());
}

#[test]
fn parked_writes_flush_after_remote_ack() {
    let (left, right) = UnixStream::pair().unwrap();

    let server = thread::spawn(move || {
        let input = left.try_clone().unwrap();
        let mut channel = Channel::new(
            input,
            left,
            ChannelConfig {
                negotiated: true,
                ..ChannelConfig::default()
            },
        )
        .unwrap();

        wait_for_open(&mut channel);

        // The two flushed writes may coalesce on the socket; collect until
        // both are in and assert on the byte order.
        let mut received = Vec::new();
        while received.len() < b"firstsecond".len() {
            received.extend_from_slice(&wait_for_data(&mut channel));
        }
        received
    });

    let input = right.try_clone().unwrap();
    let mut channel = Channel::new(
        input,
        right,
        ChannelConfig {
            label: Bytes::from_static(b"queue"),
            ..ChannelConfig::default()
        },
    )
    .unwrap();

    // Parked before the handshake has even started.
    channel.write(Bytes::from_static(b"first")).unwrap();
    channel.write(Bytes::from_static(b"second")).unwrap();

    wait_for_open(&mut channel);

    let received = server.join().unwrap();
    assert_eq!(received, b"firstsecond");
}
