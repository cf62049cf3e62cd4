mod byte_order;
mod end_point;
mod integers;
mod ip_address;
mod sockaddr;
mod socket;
mod socket_errors;
mod subsystem;
mod transport_end_point;

pub use byte_order::{
    byte_order, is_big_endian, is_little_endian, to_host_order, to_network_order, ByteOrder,
    ByteOrderSwap,
};
pub use end_point::{EndPointParseError, IpEndPoint};
pub use integers::{
    NetworkI16, NetworkI32, NetworkI64, NetworkInteger, NetworkPrimitive, NetworkU16, NetworkU32,
    NetworkU64,
};
pub use ip_address::{
    is_valid_ipv4_address, is_valid_ipv6_address, AddressParseError, Family, IpAddress,
    IPV4_ADDRESS_SIZE, IPV6_ADDRESS_SIZE,
};
pub use sockaddr::UnsupportedAddressFamilyError;
pub use socket::{read_all, resolve_host, write_all, MsgFlags, Socket};
pub use socket_errors::{
    socket_error_from_code, AddressInfoError, NonBlockingStatus, SocketError,
    UnsupportedOperation,
};
pub use subsystem::NetworkSubsystem;
pub use transport_end_point::{Transport, TransportEndPoint, TransportParseError};
