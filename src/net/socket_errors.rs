use std::ffi::CStr;
use std::fmt;

use crate::error::{Error, ErrorInfo};

/// Generic native socket failure wrapping an OS error code. Fatal.
pub struct SocketError {
    code: i32,
    message: String,
}

impl SocketError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_os_code(code: i32) -> Self {
        let message = std::io::Error::from_raw_os_error(code).to_string();
        Self::new(code, message)
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl ErrorInfo for SocketError {
    fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} = {:#x})", self.message, self.code, self.code)
    }
}

/// Resolver failure wrapping a getaddrinfo-style error code. Fatal.
pub struct AddressInfoError {
    code: i32,
    message: String,
}

impl AddressInfoError {
    pub fn from_gai_code(code: i32) -> Self {
        let message = unsafe { CStr::from_ptr(libc::gai_strerror(code)) }
            .to_string_lossy()
            .into_owned();
        Self { code, message }
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl ErrorInfo for AddressInfoError {
    fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} = {:#x})", self.message, self.code, self.code)
    }
}

/// The handle is non-blocking and the operation would block. Expected and
/// retry-safe, so discarding it unobserved is allowed.
pub struct NonBlockingStatus;

impl ErrorInfo for NonBlockingStatus {
    fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Socket is non-blocking, and the operation would block.")
    }

    fn is_fatal(&self) -> bool {
        false
    }
}

/// The operation does not apply to this socket (e.g. `listen` on UDP);
/// the caller is expected to take an alternate code path.
pub struct UnsupportedOperation;

impl ErrorInfo for UnsupportedOperation {
    fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported operation.")
    }

    fn is_fatal(&self) -> bool {
        false
    }
}

/// Classifies a native error code into the typed taxonomy.
pub fn socket_error_from_code(code: i32) -> Error {
    if code == libc::EAGAIN || code == libc::EWOULDBLOCK {
        Error::new(NonBlockingStatus)
    } else if code == libc::EOPNOTSUPP || code == libc::ENOTSUP {
        Error::new(UnsupportedOperation)
    } else {
        Error::new(SocketError::from_os_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::consume_error;

    #[test]
    fn test_would_block_maps_to_non_blocking_status() {
        let e = socket_error_from_code(libc::EAGAIN);
        assert!(e.is_a::<NonBlockingStatus>());
        consume_error(e);

        let e = socket_error_from_code(libc::EWOULDBLOCK);
        assert!(e.is_a::<NonBlockingStatus>());
        consume_error(e);
    }

    #[test]
    fn test_unsupported_maps_to_unsupported_operation() {
        let e = socket_error_from_code(libc::EOPNOTSUPP);
        assert!(e.is_a::<UnsupportedOperation>());
        consume_error(e);
    }

    #[test]
    fn test_other_codes_map_to_socket_error() {
        let mut e = socket_error_from_code(libc::ECONNREFUSED);
        assert!(e.is_a::<SocketError>());
        let payload = e.take_payload().expect("payload");
        let socket_error = payload
            .downcast_ref::<SocketError>()
            .expect("socket error payload");
        assert_eq!(socket_error.code(), libc::ECONNREFUSED);
        assert!(payload.is_fatal());
    }

    #[test]
    fn test_socket_error_log_includes_code() {
        let e = SocketError::new(111, "Connection refused");
        assert_eq!(
            (&e as &dyn ErrorInfo).message(),
            "Connection refused (111 = 0x6f)"
        );
    }
}
