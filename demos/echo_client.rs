//! Echo protocol client: reads lines from stdin, sends each to the
//! server, and prints the reply.
//!
//! Usage: echo-client <address>:<port>[/<tcp|udp>]

use std::io::BufRead;
use std::process::ExitCode;

use strictnet::net::{read_all, write_all, Socket, TransportEndPoint};
use strictnet::{handle_all_errors, on_any, Error, ErrorInfo, Expected};

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

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(ep_text) = args.get(1) else {
        eprintln!("Usage: {} <address>:<port>[/<tcp|udp>]", args[0]);
        return ExitCode::from(1);
    };

    let Some(remote) = TransportEndPoint::parse(ep_text) else {
        eprintln!("Unable to parse endpoint: {ep_text}");
        return ExitCode::from(1);
    };

    let mut client = unwrap_or_die(Socket::open(
        remote.address().family(),
        remote.transport(),
    ));
    let connected = unwrap_or_die(client.connect(*remote.ip_end_point()));
    println!("Connected to {connected}.");

    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };

        let mut send_result = write_all(&mut client, line.as_bytes());
        if send_result.is_failure() {
            die(send_result);
        }

        match unwrap_or_die(read_all(&mut client)) {
            Some(reply) => println!("{reply}"),
            None => break,
        }
    }

    client.close();
    ExitCode::SUCCESS
}
