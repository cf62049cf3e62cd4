use std::os::fd::{AsRawFd, RawFd};

use bitflags::bitflags;
use libc::c_int;
use sysctl::Sysctl;

use crate::error::{Error, Expected};
use crate::sys;

use super::end_point::IpEndPoint;
use super::integers::NetworkU16;
use super::ip_address::{Family, IpAddress};
use super::sockaddr::{address_family, address_length};
use super::socket_errors::{socket_error_from_code, AddressInfoError, UnsupportedOperation};
use super::subsystem::NetworkSubsystem;
use super::transport_end_point::Transport;

bitflags! {
    /// Native flag bits accepted by the send/recv family.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MsgFlags: c_int {
        const PEEK = libc::MSG_PEEK;
        const OOB = libc::MSG_OOB;
        const DONTWAIT = libc::MSG_DONTWAIT;
        const WAITALL = libc::MSG_WAITALL;
        const NOSIGNAL = libc::MSG_NOSIGNAL;
        const DONTROUTE = libc::MSG_DONTROUTE;
        const TRUNC = libc::MSG_TRUNC;
    }
}

/// Synchronous, error-checked wrapper around a native socket.
///
/// Every OS-facing operation returns an [`Expected`] carrying either the
/// operation's natural result or a typed error; see the crate-level notes
/// on the mandatory-check contract. The socket is move-only and not
/// internally synchronized: sharing one instance across threads without
/// external locking is on the caller.
///
/// `close` is terminal. The descriptor is also closed when the socket is
/// dropped without an explicit close.
pub struct Socket {
    fd: RawFd,
    family: Family,
    transport: Transport,
    local: Option<IpEndPoint>,
    remote: Option<IpEndPoint>,
}

impl Socket {
    /// Opens a native socket for the given family and transport.
    pub fn open(family: Family, transport: Transport) -> Expected<Socket> {
        NetworkSubsystem::acquire();

        match sys::open(address_family(family), transport.socket_type(), transport.protocol()) {
            Ok(fd) => Expected::new(Socket {
                fd,
                family,
                transport,
                local: None,
                remote: None,
            }),
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    /// The bound local endpoint, or family-default `any:0` when unbound.
    pub fn local(&self) -> IpEndPoint {
        self.local
            .unwrap_or_else(|| IpEndPoint::new(self.default_address(), 0_u16))
    }

    /// The remote endpoint of the communication, if any.
    pub fn remote(&self) -> Option<&IpEndPoint> {
        self.remote.as_ref()
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// The native descriptor backing this socket.
    pub fn descriptor(&self) -> RawFd {
        self.fd
    }

    /// Binds to the given local endpoint and returns the endpoint actually
    /// bound (the system fills in a port of 0).
    pub fn bind(&mut self, local_end_point: IpEndPoint) -> Expected<IpEndPoint> {
        let storage: libc::sockaddr_storage = local_end_point.into();
        let len = address_length(local_end_point.address().family());

        match sys::bind(self.fd, &storage, len) {
            Ok(()) => {
                self.update_local_endpoint();
                Expected::new(self.local())
            }
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    pub fn bind_address(
        &mut self,
        local_address: IpAddress,
        local_port: impl Into<NetworkU16>,
    ) -> Expected<IpEndPoint> {
        self.bind(IpEndPoint::new(local_address, local_port))
    }

    /// Binds the given port on the family-default any-address.
    pub fn bind_port(&mut self, local_port: impl Into<NetworkU16>) -> Expected<IpEndPoint> {
        self.bind(IpEndPoint::new(self.default_address(), local_port))
    }

    /// Binds a system-chosen port on the family-default any-address.
    pub fn bind_any(&mut self) -> Expected<IpEndPoint> {
        self.bind(IpEndPoint::new(self.default_address(), 0_u16))
    }

    /// Connects to the remote endpoint; returns the peer endpoint as the
    /// system reports it.
    pub fn connect(&mut self, remote_end_point: IpEndPoint) -> Expected<IpEndPoint> {
        let storage: libc::sockaddr_storage = remote_end_point.into();
        let len = address_length(remote_end_point.address().family());

        match sys::connect(self.fd, &storage, len) {
            Ok(()) => {
                self.update_local_endpoint();
                self.update_remote_endpoint();
                Expected::new(*self.remote().unwrap_or(&remote_end_point))
            }
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    pub fn connect_to(
        &mut self,
        remote_address: IpAddress,
        remote_port: impl Into<NetworkU16>,
    ) -> Expected<IpEndPoint> {
        self.connect(IpEndPoint::new(remote_address, remote_port))
    }

    /// Starts listening with the system default backlog.
    pub fn listen(&mut self) -> Expected<IpEndPoint> {
        self.listen_backlog(default_backlog())
    }

    pub fn listen_backlog(&mut self, backlog: c_int) -> Expected<IpEndPoint> {
        match sys::listen(self.fd, backlog) {
            Ok(()) => {
                self.update_local_endpoint();
                Expected::new(self.local())
            }
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    /// Accepts one pending connection as an independent connected socket.
    pub fn accept(&mut self) -> Expected<Socket> {
        match sys::accept(self.fd) {
            Ok((fd, _storage, _len)) => {
                let mut accepted = Socket {
                    fd,
                    family: self.family,
                    transport: self.transport,
                    local: None,
                    remote: None,
                };
                accepted.update_local_endpoint();
                accepted.update_remote_endpoint();
                if let Some(remote) = accepted.remote() {
                    info!("strictnet: accepted connection from {remote}");
                }
                Expected::new(accepted)
            }
            Err(code) => {
                error!("strictnet: failed to accept connection: {code}");
                Expected::from_error(socket_error_from_code(code))
            }
        }
    }

    pub fn send(&mut self, buffer: &[u8]) -> Expected<usize> {
        self.send_with_flags(buffer, MsgFlags::empty())
    }

    pub fn send_with_flags(&mut self, buffer: &[u8], flags: MsgFlags) -> Expected<usize> {
        match sys::send(self.fd, buffer, flags.bits()) {
            Ok(sent) => Expected::new(sent),
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    pub fn recv(&mut self, buffer: &mut [u8]) -> Expected<usize> {
        self.recv_with_flags(buffer, MsgFlags::empty())
    }

    pub fn recv_with_flags(&mut self, buffer: &mut [u8], flags: MsgFlags) -> Expected<usize> {
        match sys::recv(self.fd, buffer, flags.bits()) {
            Ok(received) => Expected::new(received),
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    pub fn sendto(&mut self, buffer: &[u8], remote_end_point: &IpEndPoint) -> Expected<usize> {
        self.sendto_with_flags(buffer, MsgFlags::empty(), remote_end_point)
    }

    pub fn sendto_with_flags(
        &mut self,
        buffer: &[u8],
        flags: MsgFlags,
        remote_end_point: &IpEndPoint,
    ) -> Expected<usize> {
        let storage: libc::sockaddr_storage = (*remote_end_point).into();
        let len = address_length(remote_end_point.address().family());

        match sys::sendto(self.fd, buffer, flags.bits(), &storage, len) {
            Ok(sent) => Expected::new(sent),
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    /// Receives a datagram along with its sender.
    pub fn recvfrom(&mut self, buffer: &mut [u8]) -> Expected<(usize, IpEndPoint)> {
        self.recvfrom_with_flags(buffer, MsgFlags::empty())
    }

    pub fn recvfrom_with_flags(
        &mut self,
        buffer: &mut [u8],
        flags: MsgFlags,
    ) -> Expected<(usize, IpEndPoint)> {
        match sys::recvfrom(self.fd, buffer, flags.bits()) {
            Ok((received, storage, len)) => {
                if len == 0 {
                    return Expected::new((received, IpEndPoint::default()));
                }

                match IpEndPoint::try_from(storage) {
                    Ok(remote) => {
                        self.remote = Some(remote);
                        Expected::new((received, remote))
                    }
                    Err(_) => Expected::from_error(Error::new(UnsupportedOperation)),
                }
            }
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    /// Number of bytes currently readable without blocking.
    pub fn available(&mut self) -> Expected<usize> {
        match sys::available(self.fd) {
            Ok(count) => Expected::new(count),
            Err(code) => Expected::from_error(socket_error_from_code(code)),
        }
    }

    /// Closes the native socket and resets all cached endpoint state.
    /// Returns the raw close status; close failures are not recoverable,
    /// so they are not wrapped.
    pub fn close(&mut self) -> c_int {
        let status = sys::close(self.fd);
        if status != 0 {
            warn!("strictnet: close returned {status}");
        }
        self.fd = -1;
        self.local = None;
        self.remote = None;
        status
    }

    fn default_address(&self) -> IpAddress {
        match self.family {
            Family::IPv4 => IpAddress::ipv4_any(),
            Family::IPv6 => IpAddress::ipv6_any(),
            Family::Unspecified => IpAddress::unspecified(),
        }
    }

    fn update_local_endpoint(&mut self) {
        if let Ok(storage) = sys::local_name(self.fd) {
            if let Ok(end_point) = IpEndPoint::try_from(storage) {
                self.local = Some(end_point);
            }
        }
    }

    fn update_remote_endpoint(&mut self) {
        if let Ok(storage) = sys::peer_name(self.fd) {
            if let Ok(end_point) = IpEndPoint::try_from(storage) {
                self.remote = Some(end_point);
            }
        }
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        if self.fd >= 0 {
            let _ = sys::close(self.fd);
        }
    }
}

fn default_backlog() -> c_int {
    fn somaxconn() -> Option<c_int> {
        let ctl = sysctl::Ctl::new("net.core.somaxconn").ok()?;
        ctl.value_string().ok()?.parse().ok()
    }

    somaxconn().unwrap_or(libc::SOMAXCONN)
}

/// Resolves a host name to the distinct addresses it maps to.
pub fn resolve_host(host: &str) -> Expected<Vec<IpAddress>> {
    match sys::resolve(host) {
        Ok(storages) => {
            let mut addresses = Vec::new();
            for storage in storages {
                if let Ok(end_point) = IpEndPoint::try_from(storage) {
                    let address = *end_point.address();
                    if !addresses.contains(&address) {
                        addresses.push(address);
                    }
                }
            }
            Expected::new(addresses)
        }
        Err(code) => Expected::from_error(Error::new(AddressInfoError::from_gai_code(code))),
    }
}

/// Drains whatever the socket currently has to offer into a string.
/// `None` means the peer closed the connection.
pub fn read_all(socket: &mut Socket) -> Expected<Option<String>> {
    // Zero-length probe so a would-block status surfaces before anything
    // is allocated.
    let mut probe = [0_u8; 1];
    let mut probe_result = socket.recv(&mut probe[..0]);
    let mut probe_error = probe_result.take_error();
    if probe_error.is_failure() {
        return Expected::from_error(probe_error);
    }

    let mut available = socket.available();
    let mut available_error = available.take_error();
    if available_error.is_failure() {
        return Expected::from_error(available_error);
    }

    let mut buffer = vec![0_u8; *available.get()];
    let mut received = socket.recv(&mut buffer);
    let mut recv_error = received.take_error();
    if recv_error.is_failure() {
        return Expected::from_error(recv_error);
    }

    let received_count = *received.get();
    if received_count == 0 {
        // Connection was closed.
        return Expected::new(None);
    }

    buffer.truncate(received_count);
    Expected::new(Some(String::from_utf8_lossy(&buffer).into_owned()))
}

/// Sends all of `data`, retrying partial sends.
pub fn write_all(socket: &mut Socket, data: &[u8]) -> Error {
    let mut sent = socket.send(data);
    let mut send_error = sent.take_error();
    if send_error.is_failure() {
        return send_error;
    }

    let mut total_sent = *sent.get();
    while total_sent < data.len() {
        let mut next = socket.send(&data[total_sent..]);
        let mut next_error = next.take_error();
        if next_error.is_failure() {
            return next_error;
        }

        total_sent += *next.get();
    }

    Error::success()
}
