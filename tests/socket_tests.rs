//! Loopback client/server flows exercising the socket facade end to end.

use std::thread;
use std::time::Duration;

use strictnet::net::{
    read_all, write_all, Family, IpAddress, Socket, Transport, UnsupportedOperation,
};
use strictnet::{cant_fail, cant_fail_value, consume_error};

#[test]
fn test_tcp_echo_round_trip() {
    let mut server = cant_fail_value(Socket::open(Family::IPv4, Transport::Tcp));
    let _ = cant_fail_value(server.bind_address(IpAddress::ipv4_loopback(), 0_u16));
    let listening = cant_fail_value(server.listen());
    let port = listening.port().value();
    assert_ne!(port, 0);

    let server_thread = thread::spawn(move || {
        let mut client = cant_fail_value(server.accept());
        assert!(client.remote().is_some());

        let mut buffer = [0_u8; 1024];
        let count = cant_fail_value(client.recv(&mut buffer));
        assert_eq!(&buffer[..count], b"Hello from client");

        cant_fail(write_all(&mut client, b"Hello from server"));
        client.close();
        server.close();
    });

    let mut client = cant_fail_value(Socket::open(Family::IPv4, Transport::Tcp));
    let connected = cant_fail_value(client.connect_to(IpAddress::ipv4_loopback(), port));
    assert_eq!(connected.port().value(), port);

    cant_fail(write_all(&mut client, b"Hello from client"));

    let mut buffer = [0_u8; 1024];
    let count = cant_fail_value(client.recv(&mut buffer));
    assert_eq!(&buffer[..count], b"Hello from server");

    client.close();
    server_thread.join().expect("server thread");
}

#[test]
fn test_tcp_sequential_connections() {
    let mut server = cant_fail_value(Socket::open(Family::IPv4, Transport::Tcp));
    let _ = cant_fail_value(server.bind_address(IpAddress::ipv4_loopback(), 0_u16));
    let port = cant_fail_value(server.listen()).port().value();

    let server_thread = thread::spawn(move || {
        for _ in 0..3 {
            let mut client = cant_fail_value(server.accept());
            let mut buffer = [0_u8; 128];
            let count = cant_fail_value(client.recv(&mut buffer));
            cant_fail(write_all(&mut client, &buffer[..count]));
            client.close();
        }
        server.close();
    });

    for i in 0..3 {
        let message = format!("connection {i}");
        let mut client = cant_fail_value(Socket::open(Family::IPv4, Transport::Tcp));
        let _ = cant_fail_value(client.connect_to(IpAddress::ipv4_loopback(), port));
        cant_fail(write_all(&mut client, message.as_bytes()));

        let mut buffer = [0_u8; 128];
        let count = cant_fail_value(client.recv(&mut buffer));
        assert_eq!(&buffer[..count], message.as_bytes());
        client.close();
    }

    server_thread.join().expect("server thread");
}

#[test]
fn test_tcp_read_all_sees_buffered_data_and_disconnect() {
    let mut server = cant_fail_value(Socket::open(Family::IPv4, Transport::Tcp));
    let _ = cant_fail_value(server.bind_address(IpAddress::ipv4_loopback(), 0_u16));
    let port = cant_fail_value(server.listen()).port().value();

    let server_thread = thread::spawn(move || {
        let mut client = cant_fail_value(server.accept());
        // Let the payload land in the receive buffer first.
        thread::sleep(Duration::from_millis(200));

        let available = cant_fail_value(client.available());
        assert!(available > 0);

        let data = cant_fail_value(read_all(&mut client)).expect("payload before close");
        assert_eq!(data, "buffered payload");

        // The peer closes after sending; a drained socket reads as
        // disconnected.
        thread::sleep(Duration::from_millis(200));
        let closed = cant_fail_value(read_all(&mut client));
        assert_eq!(closed, None);

        client.close();
        server.close();
    });

    let mut client = cant_fail_value(Socket::open(Family::IPv4, Transport::Tcp));
    let _ = cant_fail_value(client.connect_to(IpAddress::ipv4_loopback(), port));
    cant_fail(write_all(&mut client, b"buffered payload"));
    thread::sleep(Duration::from_millis(300));
    client.close();

    server_thread.join().expect("server thread");
}

#[test]
fn test_udp_sendto_recvfrom_round_trip() {
    let mut server = cant_fail_value(Socket::open(Family::IPv4, Transport::Udp));
    let server_ep = cant_fail_value(server.bind_address(IpAddress::ipv4_loopback(), 0_u16));

    let mut client = cant_fail_value(Socket::open(Family::IPv4, Transport::Udp));
    let _ = cant_fail_value(client.bind_address(IpAddress::ipv4_loopback(), 0_u16));

    let sent = cant_fail_value(client.sendto(b"ping", &server_ep));
    assert_eq!(sent, 4);

    let mut buffer = [0_u8; 64];
    let (count, remote) = cant_fail_value(server.recvfrom(&mut buffer));
    assert_eq!(&buffer[..count], b"ping");

    let sent = cant_fail_value(server.sendto(b"pong", &remote));
    assert_eq!(sent, 4);

    let (count, from) = cant_fail_value(client.recvfrom(&mut buffer));
    assert_eq!(&buffer[..count], b"pong");
    assert_eq!(from, server_ep);

    client.close();
    server.close();
}

#[test]
fn test_udp_accept_is_unsupported() {
    let mut server = cant_fail_value(Socket::open(Family::IPv4, Transport::Udp));
    let _ = cant_fail_value(server.bind_address(IpAddress::ipv4_loopback(), 0_u16));

    let mut result = server.accept();
    assert!(!result.has_value());
    assert!(result.error_is_a::<UnsupportedOperation>());
    consume_error(result.take_error());
    server.close();
}

#[test]
fn test_ipv6_loopback_round_trip() {
    let mut server = cant_fail_value(Socket::open(Family::IPv6, Transport::Tcp));
    let bound = cant_fail_value(server.bind_address(IpAddress::ipv6_loopback(), 0_u16));
    assert_eq!(bound.address().to_string(), "::1");
    let port = cant_fail_value(server.listen()).port().value();

    let server_thread = thread::spawn(move || {
        let mut client = cant_fail_value(server.accept());
        let mut buffer = [0_u8; 16];
        let count = cant_fail_value(client.recv(&mut buffer));
        cant_fail(write_all(&mut client, &buffer[..count]));
        client.close();
        server.close();
    });

    let mut client = cant_fail_value(Socket::open(Family::IPv6, Transport::Tcp));
    let _ = cant_fail_value(client.connect_to(IpAddress::ipv6_loopback(), port));
    cant_fail(write_all(&mut client, b"six"));

    let mut buffer = [0_u8; 16];
    let count = cant_fail_value(client.recv(&mut buffer));
    assert_eq!(&buffer[..count], b"six");

    client.close();
    server_thread.join().expect("server thread");
}
