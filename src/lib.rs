//! Cross-platform socket and address toolkit with mandatory-check error
//! propagation.
//!
//! The crate has two halves. [`net`] holds the address machinery
//! (IPv4/IPv6 parsing and canonical formatting, endianness-safe
//! [`net::NetworkInteger`] wrappers, endpoint tuples) and the synchronous
//! [`net::Socket`] facade over the native socket API. The crate root
//! re-exports the checked result types every socket operation returns
//! through: [`Error`] and [`Expected`], whose failure payloads must be
//! observed before destruction; an unobserved failure aborts the process
//! instead of disappearing.

#[macro_use]
pub(crate) mod sys;

#[macro_use]
pub(crate) mod logging;

mod error;

pub mod net;

pub use error::{
    cant_fail, cant_fail_value, consume_error, error_message, error_to_bool,
    expected_to_optional, handle_all_errors, handle_errors, join_errors,
    log_all_unhandled_errors, on, on_any, on_owned, AnyHandler, AsAny, Error, ErrorHandler,
    ErrorInfo, ErrorList, Expected, HandlerList, HandlerOutcome, OwnedHandler, RefHandler,
    StringError,
};
