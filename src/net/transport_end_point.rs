use std::fmt;
use std::str::FromStr;

use libc::c_int;
use thiserror::Error;

use super::end_point::IpEndPoint;
use super::integers::NetworkU16;
use super::ip_address::IpAddress;

#[derive(Debug, Error)]
pub enum TransportParseError {
    #[error("Invalid transport end point format: {0}")]
    InvalidFormat(String),
}

/// Transport protocol carried by a socket.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
    Raw,
}

impl Transport {
    /// The native socket type used for this transport.
    pub(crate) fn socket_type(self) -> c_int {
        match self {
            Transport::Tcp => libc::SOCK_STREAM,
            Transport::Udp => libc::SOCK_DGRAM,
            Transport::Raw => libc::SOCK_RAW,
        }
    }

    /// The native protocol constant used for this transport.
    pub(crate) fn protocol(self) -> c_int {
        match self {
            Transport::Tcp => libc::IPPROTO_TCP,
            Transport::Udp => libc::IPPROTO_UDP,
            Transport::Raw => libc::IPPROTO_RAW,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
            Transport::Raw => "raw",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// An IP end point paired with a transport protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TransportEndPoint {
    end_point: IpEndPoint,
    transport: Transport,
}

impl TransportEndPoint {
    pub fn new(end_point: IpEndPoint, transport: Transport) -> Self {
        Self {
            end_point,
            transport,
        }
    }

    pub fn ip_end_point(&self) -> &IpEndPoint {
        &self.end_point
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn address(&self) -> &IpAddress {
        self.end_point.address()
    }

    pub fn port(&self) -> NetworkU16 {
        self.end_point.port()
    }

    /// Parses `endpoint[/proto]` where proto is one of tcp, udp or raw,
    /// case-insensitively. A missing proto segment means tcp; an unknown
    /// token fails the parse.
    pub fn parse(text: &str) -> Option<TransportEndPoint> {
        let mut end_point_len = text.len();
        if let Some(slash) = text.find('/') {
            if slash > 0 {
                end_point_len = slash;
            }
        }

        let end_point = IpEndPoint::parse(&text[..end_point_len])?;
        if end_point_len == text.len() {
            return Some(TransportEndPoint::new(end_point, Transport::Tcp));
        }

        let token = &text[end_point_len + 1..];
        let transport = if token.eq_ignore_ascii_case("tcp") {
            Transport::Tcp
        } else if token.eq_ignore_ascii_case("udp") {
            Transport::Udp
        } else if token.eq_ignore_ascii_case("raw") {
            Transport::Raw
        } else {
            return None;
        };

        Some(TransportEndPoint::new(end_point, transport))
    }
}

impl FromStr for TransportEndPoint {
    type Err = TransportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| TransportParseError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for TransportEndPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.end_point, self.transport)
    }
}
