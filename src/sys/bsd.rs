//! BSD socket API provider.
//!
//! Thin wrappers over the native calls the socket facade needs. Failures
//! are reported as raw errno values; classifying them into typed errors is
//! the caller's concern.

use std::ffi::CString;
use std::mem;
use std::os::fd::RawFd;
use std::ptr;

use libc::{c_int, c_void, sockaddr, sockaddr_storage, socklen_t};

fn errno_of(err: std::io::Error) -> i32 {
    err.raw_os_error().unwrap_or(-1)
}

pub(crate) fn open(family: c_int, socket_type: c_int, protocol: c_int) -> Result<RawFd, i32> {
    syscall!(socket(family, socket_type, protocol)).map_err(errno_of)
}

pub(crate) fn bind(fd: RawFd, addr: &sockaddr_storage, len: socklen_t) -> Result<(), i32> {
    syscall!(bind(fd, addr as *const _ as *const sockaddr, len))
        .map(|_| ())
        .map_err(errno_of)
}

pub(crate) fn connect(fd: RawFd, addr: &sockaddr_storage, len: socklen_t) -> Result<(), i32> {
    syscall!(connect(fd, addr as *const _ as *const sockaddr, len))
        .map(|_| ())
        .map_err(errno_of)
}

pub(crate) fn listen(fd: RawFd, backlog: c_int) -> Result<(), i32> {
    syscall!(listen(fd, backlog)).map(|_| ()).map_err(errno_of)
}

pub(crate) fn accept(fd: RawFd) -> Result<(RawFd, sockaddr_storage, socklen_t), i32> {
    let mut addr: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;
    let remote = syscall!(accept(
        fd,
        &mut addr as *mut _ as *mut sockaddr,
        &mut len as *mut _
    ))
    .map_err(errno_of)?;
    Ok((remote, addr, len))
}

pub(crate) fn send(fd: RawFd, buffer: &[u8], flags: c_int) -> Result<usize, i32> {
    syscall!(send(
        fd,
        buffer.as_ptr() as *const c_void,
        buffer.len(),
        flags
    ))
    .map(|sent| sent as usize)
    .map_err(errno_of)
}

pub(crate) fn recv(fd: RawFd, buffer: &mut [u8], flags: c_int) -> Result<usize, i32> {
    syscall!(recv(
        fd,
        buffer.as_mut_ptr() as *mut c_void,
        buffer.len(),
        flags
    ))
    .map(|received| received as usize)
    .map_err(errno_of)
}

pub(crate) fn sendto(
    fd: RawFd,
    buffer: &[u8],
    flags: c_int,
    addr: &sockaddr_storage,
    len: socklen_t,
) -> Result<usize, i32> {
    syscall!(sendto(
        fd,
        buffer.as_ptr() as *const c_void,
        buffer.len(),
        flags,
        addr as *const _ as *const sockaddr,
        len
    ))
    .map(|sent| sent as usize)
    .map_err(errno_of)
}

pub(crate) fn recvfrom(
    fd: RawFd,
    buffer: &mut [u8],
    flags: c_int,
) -> Result<(usize, sockaddr_storage, socklen_t), i32> {
    let mut addr: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;
    let received = syscall!(recvfrom(
        fd,
        buffer.as_mut_ptr() as *mut c_void,
        buffer.len(),
        flags,
        &mut addr as *mut _ as *mut sockaddr,
        &mut len as *mut _
    ))
    .map_err(errno_of)?;
    Ok((received as usize, addr, len))
}

// Close is deliberately unwrapped; the native status goes straight back to
// the caller.
pub(crate) fn close(fd: RawFd) -> c_int {
    unsafe { libc::close(fd) }
}

pub(crate) fn local_name(fd: RawFd) -> Result<sockaddr_storage, i32> {
    let mut addr: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;
    syscall!(getsockname(
        fd,
        &mut addr as *mut _ as *mut sockaddr,
        &mut len as *mut _
    ))
    .map_err(errno_of)?;
    Ok(addr)
}

pub(crate) fn peer_name(fd: RawFd) -> Result<sockaddr_storage, i32> {
    let mut addr: sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<sockaddr_storage>() as socklen_t;
    syscall!(getpeername(
        fd,
        &mut addr as *mut _ as *mut sockaddr,
        &mut len as *mut _
    ))
    .map_err(errno_of)?;
    Ok(addr)
}

pub(crate) fn available(fd: RawFd) -> Result<usize, i32> {
    let mut count: c_int = 0;
    syscall!(ioctl(fd, libc::FIONREAD, &mut count as *mut c_int)).map_err(errno_of)?;
    Ok(count as usize)
}

// Resolves a node name to socket addresses. Failures carry a
// getaddrinfo-style code, not an errno.
pub(crate) fn resolve(node: &str) -> Result<Vec<sockaddr_storage>, i32> {
    let c_node = CString::new(node).map_err(|_| libc::EAI_NONAME)?;

    let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;

    let mut result_ptr: *mut libc::addrinfo = ptr::null_mut();
    let status = unsafe {
        libc::getaddrinfo(c_node.as_ptr(), ptr::null(), &hints, &mut result_ptr)
    };

    if status != 0 {
        if !result_ptr.is_null() {
            unsafe { libc::freeaddrinfo(result_ptr) };
        }
        return Err(status);
    }

    let mut addresses = Vec::new();
    let mut current = result_ptr;
    while !current.is_null() {
        let entry = unsafe { &*current };
        if !entry.ai_addr.is_null() {
            let mut storage: sockaddr_storage = unsafe { mem::zeroed() };
            let len = (entry.ai_addrlen as usize).min(mem::size_of::<sockaddr_storage>());
            unsafe {
                ptr::copy_nonoverlapping(
                    entry.ai_addr as *const u8,
                    &mut storage as *mut _ as *mut u8,
                    len,
                );
            }
            addresses.push(storage);
        }
        current = entry.ai_next;
    }

    if !result_ptr.is_null() {
        unsafe { libc::freeaddrinfo(result_ptr) };
    }

    Ok(addresses)
}
