use std::{
    any::Any,
    error::Error,
    fmt::{self, Debug, Display},
    panic,
};

/// The value produced by every call through a wrapped callable.
///
/// Exactly one of `data` / `error` exists. Always check [`is_error`] (or
/// match on the variant) before trusting either side; an error value may
/// well be "empty" (`()`, an empty string, ...) and still be a failure.
///
/// [`is_error`]: WrappedResult::is_error
#[must_use]
#[derive(Debug)]
pub enum WrappedResult<T, E> {
    Success(T),
    Failure(Caught<E>),
}

impl<T, E> WrappedResult<T, E> {
    pub fn is_error(&self) -> bool {
        matches!(self, WrappedResult::Failure(..))
    }

    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            WrappedResult::Success(data) => Some(data),
            WrappedResult::Failure(..) => None,
        }
    }

    pub fn error(&self) -> Option<&Caught<E>> {
        match self {
            WrappedResult::Success(..) => None,
            WrappedResult::Failure(error) => Some(error),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            WrappedResult::Success(data) => Some(data),
            WrappedResult::Failure(..) => None,
        }
    }

    pub fn into_error(self) -> Option<Caught<E>> {
        match self {
            WrappedResult::Success(..) => None,
            WrappedResult::Failure(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, Caught<E>> {
        match self {
            WrappedResult::Success(data) => Ok(data),
            WrappedResult::Failure(error) => Err(error),
        }
    }

    /// `[error, data]` ordering, where only one side is `Some`.
    pub fn into_tuple(self) -> (Option<Caught<E>>, Option<T>) {
        match self {
            WrappedResult::Success(data) => (None, Some(data)),
            WrappedResult::Failure(error) => (Some(error), None),
        }
    }

    pub fn map<U, F>(self, op: F) -> WrappedResult<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            WrappedResult::Success(data) => WrappedResult::Success(op(data)),
            WrappedResult::Failure(error) => WrappedResult::Failure(error),
        }
    }
}

impl<T, E> From<Result<T, E>> for WrappedResult<T, E> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(data) => WrappedResult::Success(data),
            Err(err) => WrappedResult::Failure(Caught::Raised(err)),
        }
    }
}

/// Whatever a wrapped callable failed with, untouched.
pub enum Caught<E> {
    /// The callable returned `Err(E)`.
    Raised(E),
    /// The callable (or its future) panicked.
    Panicked(Panic),
}

impl<E> Caught<E> {
    pub fn is_panic(&self) -> bool {
        matches!(self, Caught::Panicked(..))
    }

    pub fn raised(&self) -> Option<&E> {
        match self {
            Caught::Raised(err) => Some(err),
            Caught::Panicked(..) => None,
        }
    }

    pub fn panic(&self) -> Option<&Panic> {
        match self {
            Caught::Raised(..) => None,
            Caught::Panicked(panic) => Some(panic),
        }
    }

    pub fn into_raised(self) -> Option<E> {
        match self {
            Caught::Raised(err) => Some(err),
            Caught::Panicked(..) => None,
        }
    }

    /// Returns the raised error, resuming the panic if there was one.
    pub fn unwrap_or_resume(self) -> E {
        match self {
            Caught::Raised(err) => err,
            Caught::Panicked(panic) => panic.resume(),
        }
    }
}

impl<E> Debug for Caught<E>
where
    E: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caught::Raised(err) => f.debug_tuple("Raised").field(err).finish(),
            Caught::Panicked(panic) => f.debug_tuple("Panicked").field(panic).finish(),
        }
    }
}

impl<E> Display for Caught<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caught::Raised(err) => Display::fmt(err, f),
            Caught::Panicked(panic) => Display::fmt(panic, f),
        }
    }
}

impl<E> Error for Caught<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Caught::Raised(err) => err.source(),
            Caught::Panicked(..) => None,
        }
    }
}

/// Payload of a caught panic.
pub struct Panic {
    payload: Box<dyn Any + Send + 'static>,
}

impl Panic {
    pub fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self { payload }
    }

    /// The panic message, if the payload is a string.
    ///
    /// `panic!("...")` produces either `&'static str` or `String`, anything
    /// else came from `std::panic::panic_any`.
    pub fn message(&self) -> Option<&str> {
        if let Some(s) = self.payload.downcast_ref::<&'static str>() {
            Some(s)
        } else if let Some(s) = self.payload.downcast_ref::<String>() {
            Some(s.as_str())
        } else {
            None
        }
    }

    pub fn downcast_ref<P>(&self) -> Option<&P>
    where
        P: Any,
    {
        self.payload.downcast_ref()
    }

    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }

    /// Continues unwinding with the original payload.
    pub fn resume(self) -> ! {
        panic::resume_unwind(self.payload)
    }
}

impl Debug for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => f.debug_tuple("Panic").field(&msg).finish(),
            None => f.debug_tuple("Panic").field(&"<non-string payload>").finish(),
        }
    }
}

impl Display for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "panicked: {}", msg),
            None => write!(f, "panicked with a non-string payload"),
        }
    }
}

impl Error for Panic {}
