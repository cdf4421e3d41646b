//! Telling awaitables apart from plain values.
//!
//! There is no runtime reflection involved: whether something is awaited is
//! decided by which of the traits below its type implements.
//!
//! # Limitation
//!
//! Every value implementing `Future<Output = Result<T, E>>` is treated as an
//! awaitable and gets driven to completion. A callable that wants to hand a
//! future back to its caller *as data* has to return it inside `Ok(..)`.

use std::{
    fmt::{self, Debug},
    future::{Future, IntoFuture},
};

use futures::future::{self, BoxFuture, Either, FutureExt};

/// How a single invocation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableKind {
    /// Ran synchronously and produced a plain value.
    Plain,
    /// Ran synchronously but handed back an awaitable.
    ReturnsAwaitable,
    /// The callable itself is asynchronous.
    Asynchronous,
}

/// Something that can settle later to `Ok(Data)` or `Err(Error)`.
///
/// Implemented for everything that is [`IntoFuture`] with a `Result` output,
/// which covers plain futures and [`Deferred`].
pub trait Awaitable {
    type Data;
    type Error;
    type Future: Future<Output = Result<Self::Data, Self::Error>>;

    /// Coerces `self` into the future the continuations are attached to.
    fn into_awaitable(self) -> Self::Future;
}

impl<A, T, E> Awaitable for A
where
    A: IntoFuture<Output = Result<T, E>>,
{
    type Data = T;
    type Error = E;
    type Future = A::IntoFuture;

    fn into_awaitable(self) -> Self::Future {
        self.into_future()
    }
}

/// An explicitly constructed awaitable.
///
/// This is [`IntoFuture`] rather than [`Future`], so a closure returning it
/// counts as a synchronous callable that returns an awaitable.
#[must_use]
pub struct Deferred<'a, T, E> {
    inner: BoxFuture<'a, Result<T, E>>,
}

impl<'a, T, E> Deferred<'a, T, E> {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        Self { inner: fut.boxed() }
    }

    pub fn resolved(data: T) -> Self
    where
        T: Send + 'a,
        E: Send + 'a,
    {
        Self::new(future::ok(data))
    }

    pub fn rejected(error: E) -> Self
    where
        T: Send + 'a,
        E: Send + 'a,
    {
        Self::new(future::err(error))
    }
}

impl<'a, T, E> IntoFuture for Deferred<'a, T, E> {
    type IntoFuture = BoxFuture<'a, Result<T, E>>;
    type Output = Result<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.inner
    }
}

impl<T, E> Debug for Deferred<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

/// What a synchronous invocation handed back.
///
/// Callables that only know at run time whether they finish immediately
/// return this directly. Awaitables that are not `Send` cannot go through
/// here; return them from an asynchronous callable instead.
#[derive(Debug)]
pub enum Completion<'a, T, E> {
    Ready(Result<T, E>),
    Pending(Deferred<'a, T, E>),
}

impl<'a, T, E> Completion<'a, T, E> {
    pub fn ok(data: T) -> Self {
        Completion::Ready(Ok(data))
    }

    pub fn err(error: E) -> Self {
        Completion::Ready(Err(error))
    }

    pub fn pending<A>(awaitable: A) -> Self
    where
        A: Awaitable<Data = T, Error = E>,
        A::Future: Send + 'a,
    {
        Completion::Pending(Deferred::new(awaitable.into_awaitable()))
    }

    pub fn kind(&self) -> CallableKind {
        match self {
            Completion::Ready(..) => CallableKind::Plain,
            Completion::Pending(..) => CallableKind::ReturnsAwaitable,
        }
    }
}

impl<T, E> From<Result<T, E>> for Completion<'_, T, E> {
    fn from(res: Result<T, E>) -> Self {
        Completion::Ready(res)
    }
}

impl<'a, T, E> From<Deferred<'a, T, E>> for Completion<'a, T, E> {
    fn from(deferred: Deferred<'a, T, E>) -> Self {
        Completion::Pending(deferred)
    }
}

/// Return values of synchronous callables.
///
/// `Left` is a value that is already there, `Right` has to be awaited.
pub trait Classify {
    type Data;
    type Error;
    type Future: Future<Output = Result<Self::Data, Self::Error>>;

    fn classify(self) -> Either<Result<Self::Data, Self::Error>, Self::Future>;
}

impl<T, E> Classify for Result<T, E> {
    type Data = T;
    type Error = E;
    type Future = future::Ready<Result<T, E>>;

    fn classify(self) -> Either<Self, Self::Future> {
        Either::Left(self)
    }
}

impl<'a, T, E> Classify for Completion<'a, T, E> {
    type Data = T;
    type Error = E;
    type Future = BoxFuture<'a, Result<T, E>>;

    fn classify(self) -> Either<Result<T, E>, Self::Future> {
        match self {
            Completion::Ready(res) => Either::Left(res),
            Completion::Pending(deferred) => Either::Right(deferred.into_future()),
        }
    }
}

impl<'a, T, E> Classify for Deferred<'a, T, E> {
    type Data = T;
    type Error = E;
    type Future = BoxFuture<'a, Result<T, E>>;

    fn classify(self) -> Either<Result<T, E>, Self::Future> {
        Either::Right(self.into_future())
    }
}
