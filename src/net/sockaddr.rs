//! Bit-exact mapping between end points and the native socket address
//! structures.

use libc::{c_int, sa_family_t, socklen_t};

use thiserror::Error;

use super::end_point::IpEndPoint;
use super::integers::NetworkU16;
use super::ip_address::{Family, IpAddress, IPV4_ADDRESS_SIZE, IPV6_ADDRESS_SIZE};

#[derive(Debug, Error)]
#[error("Unsupported address family: {0}")]
pub struct UnsupportedAddressFamilyError(pub sa_family_t);

pub(crate) fn address_family(family: Family) -> c_int {
    match family {
        Family::IPv4 => libc::AF_INET,
        Family::IPv6 => libc::AF_INET6,
        Family::Unspecified => libc::AF_UNSPEC,
    }
}

pub(crate) fn address_length(family: Family) -> socklen_t {
    match family {
        Family::IPv4 => std::mem::size_of::<libc::sockaddr_in>() as socklen_t,
        Family::IPv6 => std::mem::size_of::<libc::sockaddr_in6>() as socklen_t,
        Family::Unspecified => 0,
    }
}

impl From<IpEndPoint> for libc::sockaddr_storage {
    fn from(ep: IpEndPoint) -> libc::sockaddr_storage {
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };

        if ep.address().is_ipv6() {
            let mut s6_addr = [0_u8; IPV6_ADDRESS_SIZE];
            s6_addr.copy_from_slice(ep.address().address_bytes());

            let addr_in6 = libc::sockaddr_in6 {
                sin6_family: libc::AF_INET6 as sa_family_t,
                sin6_port: ep.port().network_value(),
                sin6_flowinfo: 0,
                sin6_addr: libc::in6_addr { s6_addr },
                sin6_scope_id: ep.address().scope_id(),
            };

            unsafe {
                let storage_ptr = &mut storage as *mut _ as *mut libc::sockaddr_in6;
                std::ptr::write(storage_ptr, addr_in6);
            }
        } else {
            let mut octets = [0_u8; IPV4_ADDRESS_SIZE];
            octets.copy_from_slice(ep.address().address_bytes());

            let addr_in = libc::sockaddr_in {
                sin_family: libc::AF_INET as sa_family_t,
                sin_port: ep.port().network_value(),
                sin_addr: libc::in_addr {
                    s_addr: u32::from_be_bytes(octets).to_be(),
                },
                sin_zero: [0; 8],
            };

            unsafe {
                let storage_ptr = &mut storage as *mut _ as *mut libc::sockaddr_in;
                std::ptr::write(storage_ptr, addr_in);
            }
        }

        storage
    }
}

impl TryFrom<libc::sockaddr_storage> for IpEndPoint {
    type Error = UnsupportedAddressFamilyError;

    fn try_from(storage: libc::sockaddr_storage) -> Result<Self, UnsupportedAddressFamilyError> {
        let family = storage.ss_family;

        if family == libc::AF_INET as sa_family_t {
            let addr_in = unsafe {
                *(&storage as *const libc::sockaddr_storage as *const libc::sockaddr_in)
            };

            Ok(IpEndPoint::new(
                IpAddress::from_ipv4_bits(u32::from_be(addr_in.sin_addr.s_addr)),
                NetworkU16::from_network_order(addr_in.sin_port),
            ))
        } else if family == libc::AF_INET6 as sa_family_t {
            let addr_in6 = unsafe {
                *(&storage as *const libc::sockaddr_storage as *const libc::sockaddr_in6)
            };

            Ok(IpEndPoint::new(
                IpAddress::from_ipv6_bytes_scoped(addr_in6.sin6_addr.s6_addr, addr_in6.sin6_scope_id),
                NetworkU16::from_network_order(addr_in6.sin6_port),
            ))
        } else {
            Err(UnsupportedAddressFamilyError(family))
        }
    }
}
