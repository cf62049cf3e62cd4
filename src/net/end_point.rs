use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::integers::NetworkU16;
use super::ip_address::IpAddress;

#[derive(Debug, Error)]
pub enum EndPointParseError {
    #[error("Invalid end point format: {0}")]
    InvalidFormat(String),
}

/// An IP address paired with a port.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IpEndPoint {
    address: IpAddress,
    port: NetworkU16,
}

impl IpEndPoint {
    pub fn new(address: IpAddress, port: impl Into<NetworkU16>) -> Self {
        Self {
            address,
            port: port.into(),
        }
    }

    pub fn address(&self) -> &IpAddress {
        &self.address
    }

    pub fn port(&self) -> NetworkU16 {
        self.port
    }

    /// Parses `addr`, `addr:port` or `[v6addr]:port`. The split point is
    /// the last ':'; it only counts as a port separator when a ']'
    /// immediately precedes it or no other ':' occurs before it. A missing
    /// port defaults to 0; a port above 65535 fails the whole parse.
    pub fn parse(text: &str) -> Option<IpEndPoint> {
        let raw = text.as_bytes();
        let mut address_len = raw.len();

        if let Some(last_colon) = text.rfind(':') {
            if last_colon > 0 {
                if raw[last_colon - 1] == b']' {
                    address_len = last_colon;
                } else if !text[..last_colon].contains(':') {
                    address_len = last_colon;
                }
            }
        }

        let address = IpAddress::parse(&text[..address_len])?;
        if address_len == text.len() {
            return Some(IpEndPoint::new(address, 0));
        }

        let port: u32 = text[address_len + 1..].parse().ok()?;
        if port > 0xffff {
            return None;
        }

        Some(IpEndPoint::new(address, port as u16))
    }
}

impl Default for IpEndPoint {
    fn default() -> Self {
        Self::new(IpAddress::unspecified(), 0)
    }
}

impl FromStr for IpEndPoint {
    type Err = EndPointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| EndPointParseError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for IpEndPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.address.is_ipv6() {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_end_point() {
        let ep = IpEndPoint::parse("192.168.123.114:8088").expect("valid");
        assert_eq!(ep.address().to_string(), "192.168.123.114");
        assert_eq!(ep.port(), NetworkU16::new(8088));
    }

    #[test]
    fn test_parse_ipv6_end_point() {
        let ep = IpEndPoint::parse("[fc00::1234:89AB]:22").expect("valid");
        assert_eq!(ep.address().to_string(), "fc00::1234:89ab");
        assert_eq!(ep.port(), NetworkU16::new(22));
    }

    #[test]
    fn test_parse_bare_address_defaults_port_zero() {
        let ep = IpEndPoint::parse("10.0.0.7").expect("valid");
        assert_eq!(ep.port(), NetworkU16::new(0));

        let ep = IpEndPoint::parse("fc00::1").expect("valid");
        assert_eq!(ep.address().to_string(), "fc00::1");
        assert_eq!(ep.port(), NetworkU16::new(0));
    }

    #[test]
    fn test_parse_mapped_end_point() {
        let ep = IpEndPoint::parse("[::FFFF:192.168.201.232]:1234").expect("valid");
        assert_eq!(ep.address().to_string(), "::ffff:192.168.201.232");
        assert_eq!(ep.port(), NetworkU16::new(1234));
    }

    #[test]
    fn test_parse_rejects_bad_ports_and_addresses() {
        assert!(IpEndPoint::parse("224.255.255.0:98765").is_none());
        assert!(IpEndPoint::parse("123.456.789.101:80").is_none());
        assert!(IpEndPoint::parse("[fc00::1234:89AB]:123456").is_none());
        assert!(IpEndPoint::parse("[fc00::1234:89ABCD]:80").is_none());
        assert!(IpEndPoint::parse("10.0.0.1:").is_none());
        assert!(IpEndPoint::parse("10.0.0.1:http").is_none());
    }

    #[test]
    fn test_display_brackets_ipv6() {
        let ep = IpEndPoint::parse("[fc00::1]:22").expect("valid");
        assert_eq!(ep.to_string(), "[fc00::1]:22");

        let ep = IpEndPoint::parse("127.0.0.1:8080").expect("valid");
        assert_eq!(ep.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_round_trip_through_text() {
        for text in ["192.168.123.114:8088", "[fc00::1234:89ab]:22", "0.0.0.0:0"] {
            let ep = IpEndPoint::parse(text).expect("valid");
            assert_eq!(ep.to_string(), text);
            assert_eq!(text.parse::<IpEndPoint>().expect("from_str"), ep);
        }
    }
}
