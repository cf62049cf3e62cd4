//! Checked success-or-failure carriers.
//!
//! Every fallible operation in this crate reports through [`Error`] or
//! [`Expected`]. Both enforce, at runtime, that the caller observed the
//! outcome before the value is destroyed: dropping an unobserved instance
//! aborts the process with a diagnostic on stderr. Forgetting to check an
//! error is therefore an immediate, loud bug instead of a silent one.
//!
//! Observation means one of: a boolean test ([`Error::is_failure`],
//! [`Expected::has_value`]), accessing the carried value, or taking
//! ownership of the failure payload ([`Error::take_payload`],
//! [`Expected::take_error`]); for a failed `Error`, only the latter
//! counts. Failure payloads are trait objects implementing [`ErrorInfo`];
//! see [`handle_errors`](crate::handle_errors) for typed dispatch over
//! them.

mod handlers;
mod info;

use std::fmt;
use std::io::Write;
use std::mem;

pub use handlers::{
    handle_all_errors, handle_errors, on, on_any, on_owned, AnyHandler, ErrorHandler, HandlerList,
    HandlerOutcome, OwnedHandler, RefHandler,
};
pub use info::{AsAny, ErrorInfo, ErrorList, StringError};

#[inline(never)]
fn fatal_unchecked(kind: &str, payload: Option<&dyn ErrorInfo>) -> ! {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(
        stderr,
        "{kind} must be checked before access or destruction."
    );
    match payload {
        Some(payload) => {
            let _ = writeln!(stderr, "Unchecked {kind} contained error:");
            let _ = writeln!(stderr, "{}", payload.message());
        }
        None => {
            let _ = writeln!(
                stderr,
                "{kind} value was in success state. (Success values must still be \
                 checked before being destroyed.)"
            );
        }
    }
    drop(stderr);
    std::process::abort();
}

/// Move-only carrier of success or a polymorphic failure payload.
///
/// A success value must be observed with [`is_failure`](Error::is_failure)
/// (or an equivalent consuming helper) before it is dropped. A failure
/// value must be consumed before it is dropped, through
/// [`take_payload`](Error::take_payload),
/// [`handle_errors`](crate::handle_errors), or [`consume_error`].
/// Violations abort.
#[must_use]
pub struct Error {
    payload: Option<Box<dyn ErrorInfo>>,
    checked: bool,
}

impl Error {
    /// A success value. It still has to be checked before destruction.
    pub fn success() -> Self {
        Self {
            payload: None,
            checked: false,
        }
    }

    /// A failure value carrying `payload`.
    pub fn new<E: ErrorInfo>(payload: E) -> Self {
        Self::from_payload(Box::new(payload))
    }

    pub fn from_payload(payload: Box<dyn ErrorInfo>) -> Self {
        Self {
            payload: Some(payload),
            checked: false,
        }
    }

    /// Boolean test: true when this is a failure. Observes a success value;
    /// a failure stays unobserved until its payload is taken.
    pub fn is_failure(&mut self) -> bool {
        self.checked = self.payload.is_none();
        self.payload.is_some()
    }

    /// Tests the dynamic type of the failure payload, if any. Does not
    /// count as an observation.
    pub fn is_a<E: ErrorInfo>(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| p.is_a::<E>())
    }

    /// Takes ownership of the failure payload (`None` for success),
    /// leaving this value observed and empty.
    pub fn take_payload(&mut self) -> Option<Box<dyn ErrorInfo>> {
        self.checked = true;
        self.payload.take()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => payload.log(f),
            None => write!(f, "success"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error({self})")
    }
}

impl Drop for Error {
    fn drop(&mut self) {
        // Don't turn an unwind already in progress into an abort.
        if std::thread::panicking() {
            return;
        }

        if !self.checked || self.payload.as_ref().is_some_and(|p| p.is_fatal()) {
            fatal_unchecked("Error", self.payload.as_deref());
        }
    }
}

enum ExpectedState<T> {
    Value(T),
    Failure(Box<dyn ErrorInfo>),
    Consumed,
}

/// Either a `T` or an owned failure payload, with the same mandatory-check
/// contract as [`Error`].
///
/// The unchecked flag is set on construction and cleared by any
/// observation: [`has_value`](Expected::has_value), value access, or
/// [`take_error`](Expected::take_error). Dropping an unobserved instance
/// aborts, except when the payload reports itself non-fatal (a would-block
/// status may be discarded).
#[must_use]
pub struct Expected<T> {
    state: ExpectedState<T>,
    unchecked: bool,
}

impl<T> Expected<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: ExpectedState::Value(value),
            unchecked: true,
        }
    }

    /// Wraps a failed [`Error`]. Panics when handed a success value; a
    /// function that returns `Expected<T>` must produce a `T` on success,
    /// never an empty error.
    pub fn from_error(mut err: Error) -> Self {
        match err.take_payload() {
            Some(payload) => Self {
                state: ExpectedState::Failure(payload),
                unchecked: true,
            },
            None => panic!("cannot create an Expected from an Error success value"),
        }
    }

    /// Boolean test: true when a value is present. Observes the instance.
    pub fn has_value(&mut self) -> bool {
        self.unchecked = false;
        matches!(self.state, ExpectedState::Value(_))
    }

    /// Tests the dynamic type of the failure payload without consuming it.
    pub fn error_is_a<E: ErrorInfo>(&self) -> bool {
        match &self.state {
            ExpectedState::Failure(payload) => payload.is_a::<E>(),
            _ => false,
        }
    }

    /// Returns the contained value. Aborts when called in a failure or
    /// consumed state.
    pub fn get(&mut self) -> &T {
        self.unchecked = false;
        match &self.state {
            ExpectedState::Value(value) => value,
            ExpectedState::Failure(payload) => fatal_unchecked("Expected", Some(payload.as_ref())),
            ExpectedState::Consumed => fatal_unchecked("Expected", None),
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.unchecked = false;
        match &mut self.state {
            ExpectedState::Value(value) => value,
            ExpectedState::Failure(payload) => fatal_unchecked("Expected", Some(payload.as_ref())),
            ExpectedState::Consumed => fatal_unchecked("Expected", None),
        }
    }

    /// Consumes the instance and returns the value. Aborts on failure.
    pub fn into_value(mut self) -> T {
        self.unchecked = false;
        match mem::replace(&mut self.state, ExpectedState::Consumed) {
            ExpectedState::Value(value) => value,
            ExpectedState::Failure(payload) => fatal_unchecked("Expected", Some(payload.as_ref())),
            ExpectedState::Consumed => fatal_unchecked("Expected", None),
        }
    }

    /// Takes ownership of the failure as an [`Error`], or a success value
    /// if a value is present (the value itself stays accessible). After a
    /// failure has been taken the instance is spent: only destruction and
    /// `has_value` remain valid.
    pub fn take_error(&mut self) -> Error {
        self.unchecked = false;
        match &self.state {
            ExpectedState::Failure(_) => {
                match mem::replace(&mut self.state, ExpectedState::Consumed) {
                    ExpectedState::Failure(payload) => Error::from_payload(payload),
                    _ => unreachable!(),
                }
            }
            _ => Error::success(),
        }
    }
}

impl<T> From<T> for Expected<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Drop for Expected<T> {
    fn drop(&mut self) {
        if !self.unchecked || std::thread::panicking() {
            return;
        }

        match &self.state {
            // Dropping an unobserved non-fatal status is tolerated.
            ExpectedState::Failure(payload) if !payload.is_fatal() => {}
            ExpectedState::Failure(payload) => {
                fatal_unchecked("Expected", Some(payload.as_ref()))
            }
            _ => fatal_unchecked("Expected", None),
        }
    }
}

/// Concatenates two errors. Success joined with anything yields the other
/// side; two failures produce (or extend) a flattened [`ErrorList`] with
/// `e1`'s payloads before `e2`'s.
pub fn join_errors(mut e1: Error, mut e2: Error) -> Error {
    match (e1.take_payload(), e2.take_payload()) {
        (None, None) => Error::success(),
        (Some(payload), None) | (None, Some(payload)) => Error::from_payload(payload),
        (Some(first), Some(second)) => Error::from_payload(ErrorList::join(first, second)),
    }
}

/// Discards an error without doing anything. This is the one sanctioned
/// way to ignore a failure; the call site documents the decision.
pub fn consume_error(mut err: Error) {
    let _ = err.take_payload();
}

/// Observes `err` and reports whether it was a failure, consuming the
/// payload either way.
pub fn error_to_bool(mut err: Error) -> bool {
    err.take_payload().is_some()
}

/// Aborts if `err` is a failure. For wrapping calls that are known by
/// construction to succeed.
pub fn cant_fail(mut err: Error) {
    if let Some(payload) = err.take_payload() {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "Failure value returned from cant_fail wrapped call:");
        let _ = writeln!(stderr, "{}", payload.message());
        drop(stderr);
        std::process::abort();
    }
}

/// Unwraps `expected`, aborting if it is a failure. For wrapping calls
/// that are known by construction to succeed.
pub fn cant_fail_value<T>(mut expected: Expected<T>) -> T {
    if expected.has_value() {
        expected.into_value()
    } else {
        cant_fail(expected.take_error());
        unreachable!()
    }
}

/// Converts an `Expected` into an `Option`, silently consuming any error.
pub fn expected_to_optional<T>(mut expected: Expected<T>) -> Option<T> {
    if expected.has_value() {
        Some(expected.into_value())
    } else {
        consume_error(expected.take_error());
        None
    }
}

/// Collects every message in `err` (flattening lists), separated by
/// newlines. Consumes the error.
pub fn error_message(mut err: Error) -> String {
    let mut messages = Vec::new();
    if let Some(payload) = err.take_payload() {
        match payload.downcast::<ErrorList>() {
            Ok(list) => {
                for p in list.into_payloads() {
                    messages.push(p.message());
                }
            }
            Err(single) => messages.push(single.message()),
        }
    }

    messages.join("\n")
}

/// Logs every message in `err` to `os`, prefixed by `banner` when there is
/// at least one. Meant for the base level of a program, where remaining
/// errors are reported to the user before a clean exit.
pub fn log_all_unhandled_errors<W: Write>(mut err: Error, os: &mut W, banner: &str) {
    let Some(payload) = err.take_payload() else {
        return;
    };

    if !banner.is_empty() {
        let _ = writeln!(os, "{banner}");
    }

    match payload.downcast::<ErrorList>() {
        Ok(list) => {
            for p in list.into_payloads() {
                let _ = writeln!(os, "{}", p.message());
            }
        }
        Err(single) => {
            let _ = writeln!(os, "{}", single.message());
        }
    }
}
