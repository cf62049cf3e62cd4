//! Echo protocol server.
//!
//! Usage: echo-server <local-address>:<port>[/<tcp|udp>]

use std::process::ExitCode;

use strictnet::net::{read_all, write_all, Socket, Transport, TransportEndPoint};
use strictnet::{consume_error, handle_all_errors, on_any, Error, ErrorInfo, Expected};

fn die(err: Error) -> ! {
    handle_all_errors(
        err,
        on_any(|e: &dyn ErrorInfo| {
            eprintln!("{}", e.message());
        }),
    );
    std::process::exit(1)
}

fn unwrap_or_die<T>(mut result: Expected<T>) -> T {
    if result.has_value() {
        result.into_value()
    } else {
        die(result.take_error())
    }
}

fn handle_client(mut client: Socket) {
    loop {
        let mut incoming = read_all(&mut client);
        if !incoming.has_value() {
            die(incoming.take_error());
        }

        match incoming.into_value() {
            Some(data) => {
                println!("Received {} bytes: \"{data}\"", data.len());
                let reply = write_all(&mut client, data.as_bytes());
                if error_present(reply) {
                    client.close();
                    break;
                }
                println!("Sent {} bytes back.", data.len());
            }
            None => {
                println!("Remote end disconnected.");
                client.close();
                break;
            }
        }
    }
}

fn error_present(mut err: Error) -> bool {
    if err.is_failure() {
        consume_error(err);
        true
    } else {
        false
    }
}

fn serve_tcp(server: &mut Socket) -> ! {
    loop {
        let mut connection = server.accept();
        if !connection.has_value() {
            die(connection.take_error());
        }

        let client = connection.into_value();
        if let Some(remote) = client.remote() {
            println!("Received connection ({} <- {remote})", client.local());
        }

        std::thread::spawn(move || handle_client(client));
    }
}

fn serve_udp(server: &mut Socket) -> ! {
    let mut buffer = vec![0_u8; 64 * 1024];
    loop {
        let (count, remote) = unwrap_or_die(server.recvfrom(&mut buffer));
        println!("Received {count} bytes from {remote}.");
        let sent = unwrap_or_die(server.sendto(&buffer[..count], &remote));
        println!("Sent {sent} bytes back.");
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(ep_text) = args.get(1) else {
        eprintln!("Usage: {} <local-address>:<port>[/<tcp|udp>]", args[0]);
        return ExitCode::from(1);
    };

    let Some(requested) = TransportEndPoint::parse(ep_text) else {
        eprintln!("Unable to parse endpoint: {ep_text}");
        return ExitCode::from(1);
    };

    let mut server = unwrap_or_die(Socket::open(
        requested.address().family(),
        requested.transport(),
    ));
    let bound = unwrap_or_die(server.bind(*requested.ip_end_point()));

    if requested.transport() == Transport::Udp {
        println!("Listening on {bound}.");
        serve_udp(&mut server)
    } else {
        let listening = unwrap_or_die(server.listen());
        println!("Listening on {listening}.");
        serve_tcp(&mut server)
    }
}
