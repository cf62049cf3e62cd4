//! Typed dispatch over failure payloads.
//!
//! Handlers are matched in order against the payload's dynamic type; the
//! first applicable handler consumes it. A handler may return `()` (fully
//! handled) or a new [`Error`] (re-thrown or replaced). Payloads no handler
//! applies to propagate unchanged.

use std::marker::PhantomData;

use super::info::{ErrorInfo, ErrorList};
use super::{cant_fail, join_errors, Error};

/// Values a handler closure may return.
pub trait HandlerOutcome {
    fn into_error(self) -> Error;
}

impl HandlerOutcome for () {
    fn into_error(self) -> Error {
        Error::success()
    }
}

impl HandlerOutcome for Error {
    fn into_error(self) -> Error {
        self
    }
}

/// One typed handler in a dispatch chain.
pub trait ErrorHandler {
    fn applies_to(&self, payload: &dyn ErrorInfo) -> bool;
    fn apply(&mut self, payload: Box<dyn ErrorInfo>) -> Error;
}

/// Handler observing the payload by reference. Built by [`on`].
pub struct RefHandler<E, F, R> {
    handler: F,
    _marker: PhantomData<fn(E) -> R>,
}

/// Handler taking ownership of the payload. Built by [`on_owned`].
pub struct OwnedHandler<E, F, R> {
    handler: F,
    _marker: PhantomData<fn(E) -> R>,
}

/// Matches payloads of type `E` and passes them to `handler` by reference.
pub fn on<E, F, R>(handler: F) -> RefHandler<E, F, R>
where
    E: ErrorInfo,
    F: FnMut(&E) -> R,
    R: HandlerOutcome,
{
    RefHandler {
        handler,
        _marker: PhantomData,
    }
}

/// Matches payloads of type `E` and hands them to `handler` by value.
pub fn on_owned<E, F, R>(handler: F) -> OwnedHandler<E, F, R>
where
    E: ErrorInfo,
    F: FnMut(Box<E>) -> R,
    R: HandlerOutcome,
{
    OwnedHandler {
        handler,
        _marker: PhantomData,
    }
}

/// Handler matching any payload. Built by [`on_any`]; typically the last
/// entry in a chain.
pub struct AnyHandler<F, R> {
    handler: F,
    _marker: PhantomData<fn() -> R>,
}

/// Matches every payload and passes it to `handler` by reference.
pub fn on_any<F, R>(handler: F) -> AnyHandler<F, R>
where
    F: FnMut(&dyn ErrorInfo) -> R,
    R: HandlerOutcome,
{
    AnyHandler {
        handler,
        _marker: PhantomData,
    }
}

impl<F, R> ErrorHandler for AnyHandler<F, R>
where
    F: FnMut(&dyn ErrorInfo) -> R,
    R: HandlerOutcome,
{
    fn applies_to(&self, _payload: &dyn ErrorInfo) -> bool {
        true
    }

    fn apply(&mut self, payload: Box<dyn ErrorInfo>) -> Error {
        (self.handler)(payload.as_ref()).into_error()
    }
}

impl<E, F, R> ErrorHandler for RefHandler<E, F, R>
where
    E: ErrorInfo,
    F: FnMut(&E) -> R,
    R: HandlerOutcome,
{
    fn applies_to(&self, payload: &dyn ErrorInfo) -> bool {
        payload.is_a::<E>()
    }

    fn apply(&mut self, payload: Box<dyn ErrorInfo>) -> Error {
        match payload.downcast::<E>() {
            Ok(payload) => (self.handler)(&payload).into_error(),
            Err(payload) => Error::from_payload(payload),
        }
    }
}

impl<E, F, R> ErrorHandler for OwnedHandler<E, F, R>
where
    E: ErrorInfo,
    F: FnMut(Box<E>) -> R,
    R: HandlerOutcome,
{
    fn applies_to(&self, payload: &dyn ErrorInfo) -> bool {
        payload.is_a::<E>()
    }

    fn apply(&mut self, payload: Box<dyn ErrorInfo>) -> Error {
        match payload.downcast::<E>() {
            Ok(payload) => (self.handler)(payload).into_error(),
            Err(payload) => Error::from_payload(payload),
        }
    }
}

/// An ordered chain of handlers: a single handler or a tuple of them.
pub trait HandlerList {
    fn dispatch(&mut self, payload: Box<dyn ErrorInfo>) -> Error;
}

fn dispatch_single<H: ErrorHandler>(handler: &mut H, payload: Box<dyn ErrorInfo>) -> Error {
    if handler.applies_to(payload.as_ref()) {
        handler.apply(payload)
    } else {
        Error::from_payload(payload)
    }
}

impl<E, F, R> HandlerList for RefHandler<E, F, R>
where
    E: ErrorInfo,
    F: FnMut(&E) -> R,
    R: HandlerOutcome,
{
    fn dispatch(&mut self, payload: Box<dyn ErrorInfo>) -> Error {
        dispatch_single(self, payload)
    }
}

impl<E, F, R> HandlerList for OwnedHandler<E, F, R>
where
    E: ErrorInfo,
    F: FnMut(Box<E>) -> R,
    R: HandlerOutcome,
{
    fn dispatch(&mut self, payload: Box<dyn ErrorInfo>) -> Error {
        dispatch_single(self, payload)
    }
}

impl<F, R> HandlerList for AnyHandler<F, R>
where
    F: FnMut(&dyn ErrorInfo) -> R,
    R: HandlerOutcome,
{
    fn dispatch(&mut self, payload: Box<dyn ErrorInfo>) -> Error {
        dispatch_single(self, payload)
    }
}

macro_rules! impl_handler_list {
    ($($handler:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($handler: ErrorHandler),+> HandlerList for ($($handler,)+) {
            fn dispatch(&mut self, payload: Box<dyn ErrorInfo>) -> Error {
                let ($($handler,)+) = self;
                $(
                    if $handler.applies_to(payload.as_ref()) {
                        return $handler.apply(payload);
                    }
                )+
                Error::from_payload(payload)
            }
        }
    };
}

impl_handler_list!(H1);
impl_handler_list!(H1, H2);
impl_handler_list!(H1, H2, H3);
impl_handler_list!(H1, H2, H3, H4);
impl_handler_list!(H1, H2, H3, H4, H5);
impl_handler_list!(H1, H2, H3, H4, H5, H6);
impl_handler_list!(H1, H2, H3, H4, H5, H6, H7);
impl_handler_list!(H1, H2, H3, H4, H5, H6, H7, H8);

/// Passes the payload(s) in `err` to their matching handlers. Elements of
/// an [`ErrorList`] are dispatched independently; anything unhandled (and
/// anything the handlers returned) is re-joined, in the original relative
/// order, into the returned error, which must itself be checked.
pub fn handle_errors<H: HandlerList>(mut err: Error, mut handlers: H) -> Error {
    let Some(payload) = err.take_payload() else {
        return Error::success();
    };

    match payload.downcast::<ErrorList>() {
        Ok(list) => {
            let mut residual = Error::success();
            for payload in list.into_payloads() {
                residual = join_errors(residual, handlers.dispatch(payload));
            }
            residual
        }
        Err(payload) => handlers.dispatch(payload),
    }
}

/// Like [`handle_errors`], but by contract every payload must be handled:
/// any residual aborts the process.
pub fn handle_all_errors<H: HandlerList>(err: Error, handlers: H) {
    cant_fail(handle_errors(err, handlers));
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use crate::error::consume_error;
    use crate::error::info::StringError;

    struct Red(u32);

    impl ErrorInfo for Red {
        fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "red {}", self.0)
        }
    }

    struct Blue(u32);

    impl ErrorInfo for Blue {
        fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "blue {}", self.0)
        }
    }

    fn rainbow() -> Error {
        join_errors(
            join_errors(Error::new(Red(1)), Error::new(Blue(2))),
            Error::new(Red(3)),
        )
    }

    #[test]
    fn test_first_matching_handler_wins() {
        let mut seen = Vec::new();
        let residual = handle_errors(
            Error::new(Red(7)),
            (
                on(|e: &Red| seen.push(e.0)),
                on(|_: &Red| -> () {
                    panic!("second handler must not run");
                }),
            ),
        );
        assert!(!error_present(residual));
        assert_eq!(seen, [7]);
    }

    #[test]
    fn test_unmatched_payload_propagates() {
        let residual = handle_errors(Error::new(Blue(9)), on(|_: &Red| ()));
        assert!(residual.is_a::<Blue>());
        consume_error(residual);
    }

    #[test]
    fn test_list_elements_dispatch_independently() {
        let mut reds = Vec::new();
        let mut residual = handle_errors(rainbow(), on(|e: &Red| reds.push(e.0)));
        assert_eq!(reds, [1, 3]);

        // Exactly the unhandled subset remains.
        assert!(residual.is_a::<Blue>());
        let payload = residual.take_payload().expect("residual");
        assert_eq!(payload.message(), "blue 2");
    }

    #[test]
    fn test_residual_preserves_relative_order() {
        let err = join_errors(
            join_errors(Error::new(Blue(1)), Error::new(Red(2))),
            join_errors(Error::new(Blue(3)), Error::new(Red(4))),
        );
        let mut residual = handle_errors(err, on(|_: &Red| ()));

        let payload = residual.take_payload().expect("residual list");
        let list = match payload.downcast::<ErrorList>() {
            Ok(list) => list,
            Err(_) => panic!("expected residual list"),
        };
        let messages: Vec<String> = list.iter().map(|p| p.message()).collect();
        assert_eq!(messages, ["blue 1", "blue 3"]);
    }

    #[test]
    fn test_handler_may_rethrow_a_new_error() {
        let residual = handle_errors(
            Error::new(Red(5)),
            on_owned(|e: Box<Red>| Error::new(StringError::new(format!("wrapped red {}", e.0)))),
        );
        assert!(residual.is_a::<StringError>());
        assert_eq!(crate::error::error_message(residual), "wrapped red 5");
    }

    #[test]
    fn test_handle_all_errors_with_full_coverage() {
        let count = std::cell::Cell::new(0);
        handle_all_errors(
            rainbow(),
            (
                on(|_: &Red| count.set(count.get() + 1)),
                on(|_: &Blue| count.set(count.get() + 1)),
            ),
        );
        assert_eq!(count.get(), 3);
        handle_all_errors(Error::success(), on(|_: &Red| ()));
    }

    #[test]
    fn test_handle_all_errors_aborts_on_residual() {
        if std::env::var_os("STRICTNET_DEATH_TEST").is_some() {
            handle_all_errors(Error::new(Blue(1)), on(|_: &Red| ()));
            return;
        }

        let exe = std::env::current_exe().expect("test binary path");
        let status = std::process::Command::new(exe)
            .args([
                "error::handlers::tests::test_handle_all_errors_aborts_on_residual",
                "--exact",
                "--nocapture",
            ])
            .env("STRICTNET_DEATH_TEST", "1")
            .stderr(std::process::Stdio::null())
            .status()
            .expect("spawn death test");
        assert!(!status.success());
    }

    fn error_present(err: Error) -> bool {
        crate::error::error_to_bool(err)
    }
}
