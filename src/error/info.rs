use std::any::Any;
use std::fmt;

/// Object-safe access to the concrete type behind a payload trait object.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Payload carried by a failed [`Error`](crate::Error) or
/// [`Expected`](crate::Expected).
///
/// Implementors describe one kind of failure. The dynamic type is the
/// error's tag: handlers match on it through [`is_a`](dyn ErrorInfo::is_a)
/// without consuming the payload. `is_fatal` decides whether dropping the
/// carrier unobserved is a hard bug or tolerated (non-fatal kinds model
/// expected statuses such as a would-block result).
pub trait ErrorInfo: AsAny + Any + Send {
    /// Write the error message.
    fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    fn is_fatal(&self) -> bool {
        true
    }
}

struct LogDisplay<'a>(&'a dyn ErrorInfo);

impl fmt::Display for LogDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.log(f)
    }
}

impl dyn ErrorInfo {
    /// Tests the dynamic type of this payload.
    pub fn is_a<E: ErrorInfo>(&self) -> bool {
        self.as_any().is::<E>()
    }

    pub fn downcast_ref<E: ErrorInfo>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    pub fn downcast<E: ErrorInfo>(self: Box<Self>) -> Result<Box<E>, Box<dyn ErrorInfo>> {
        if self.is_a::<E>() {
            match self.into_any().downcast::<E>() {
                Ok(payload) => Ok(payload),
                Err(_) => unreachable!(),
            }
        } else {
            Err(self)
        }
    }

    /// The logged message as a string.
    pub fn message(&self) -> String {
        LogDisplay(self).to_string()
    }
}

/// Payload aggregating several other payloads.
///
/// Built by [`join_errors`](crate::join_errors); joining always flattens,
/// so an `ErrorList` never contains another `ErrorList`.
pub struct ErrorList {
    payloads: Vec<Box<dyn ErrorInfo>>,
}

impl ErrorList {
    pub(crate) fn join(
        first: Box<dyn ErrorInfo>,
        second: Box<dyn ErrorInfo>,
    ) -> Box<dyn ErrorInfo> {
        match first.downcast::<ErrorList>() {
            Ok(mut list) => {
                match second.downcast::<ErrorList>() {
                    Ok(other) => list.payloads.extend(other.payloads),
                    Err(single) => list.payloads.push(single),
                }
                list
            }
            Err(first) => match second.downcast::<ErrorList>() {
                Ok(mut list) => {
                    list.payloads.insert(0, first);
                    list
                }
                Err(second) => Box::new(ErrorList {
                    payloads: vec![first, second],
                }),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ErrorInfo> {
        self.payloads.iter().map(|p| p.as_ref())
    }

    pub(crate) fn into_payloads(self) -> Vec<Box<dyn ErrorInfo>> {
        self.payloads
    }
}

impl ErrorInfo for ErrorList {
    fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Multiple errors:")?;
        for payload in &self.payloads {
            writeln!(f, "{}", payload.message())?;
        }
        Ok(())
    }

    fn is_fatal(&self) -> bool {
        self.payloads.iter().any(|p| p.is_fatal())
    }
}

/// Free-text fatal error for configuration and parsing failures where the
/// caller is not expected to react to the message programmatically.
pub struct StringError {
    message: String,
}

impl StringError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ErrorInfo for StringError {
    fn log(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Builds a failed [`Error`](crate::Error) carrying a formatted
/// [`StringError`].
#[macro_export]
macro_rules! string_error {
    ($($arg:tt)+) => {
        $crate::Error::new($crate::StringError::new(format!($($arg)+)))
    };
}
