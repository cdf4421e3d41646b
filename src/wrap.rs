use std::{
    convert::Infallible,
    fmt::{self, Debug},
    future::Future,
    marker::PhantomData,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    task::{Context, Poll},
};

use futures::{
    future::{self, CatchUnwind, Either},
    ready, FutureExt, TryFuture,
};
use tracing::{debug, trace};

use crate::{
    classify::{Awaitable, CallableKind, Classify},
    result::{Caught, Panic, WrappedResult},
};

/// Marker for callables that run synchronously.
#[derive(Debug)]
pub enum Immediate {}

/// Marker for callables that return a future.
#[derive(Debug)]
pub enum Asynchronous {}

/// A function-like value taking `Args` as a tuple.
///
/// `Marker` only exists so that both a closure returning a `Result` and a
/// closure returning a `Future` can implement this trait. It is inferred.
pub trait Callable<Args, Marker> {
    type Data;
    type Error;
    type Future: Future<Output = Result<Self::Data, Self::Error>>;

    /// Whether the callable is asynchronous before it is even invoked.
    const ASYNC: bool;

    fn invoke(&self, args: Args) -> Either<Result<Self::Data, Self::Error>, Self::Future>;
}

/// A callable returning a plain value, see [`wrap_infallible`].
#[derive(Debug, Clone)]
pub struct Plain<F>(F);

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> Callable<($($arg,)*), Immediate> for Func
        where
            Func: Fn($($arg),*) -> Ret,
            Ret: Classify,
        {
            type Data = Ret::Data;
            type Error = Ret::Error;
            type Future = Ret::Future;

            const ASYNC: bool = false;

            #[allow(non_snake_case)]
            fn invoke(
                &self,
                ($($arg,)*): ($($arg,)*),
            ) -> Either<Result<Self::Data, Self::Error>, Self::Future> {
                (self)($($arg),*).classify()
            }
        }

        impl<Func, Fut, T, E, $($arg,)*> Callable<($($arg,)*), Asynchronous> for Func
        where
            Func: Fn($($arg),*) -> Fut,
            Fut: Future<Output = Result<T, E>>,
        {
            type Data = T;
            type Error = E;
            type Future = Fut;

            const ASYNC: bool = true;

            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Either<Result<T, E>, Fut> {
                Either::Right((self)($($arg),*))
            }
        }

        impl<Func, T, $($arg,)*> Callable<($($arg,)*), Immediate> for Plain<Func>
        where
            Func: Fn($($arg),*) -> T,
        {
            type Data = T;
            type Error = Infallible;
            type Future = future::Ready<Result<T, Infallible>>;

            const ASYNC: bool = false;

            #[allow(non_snake_case)]
            fn invoke(
                &self,
                ($($arg,)*): ($($arg,)*),
            ) -> Either<Result<T, Infallible>, Self::Future> {
                Either::Left(Ok((self.0)($($arg),*)))
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);
impl_callable!(A1, A2, A3, A4, A5, A6);
impl_callable!(A1, A2, A3, A4, A5, A6, A7);
impl_callable!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Wraps `callable` so that calling it never returns an error and never
/// panics.
///
/// Synchronous callables must return a `Result`, a [`Completion`] or a
/// [`Deferred`]. Callables that return a plain value and can only fail by
/// panicking go through [`wrap_infallible`] instead.
///
/// [`Completion`]: crate::Completion
/// [`Deferred`]: crate::Deferred
///
/// # Example
///
/// ```
/// use wrap_exception::wrap;
///
/// let parse = wrap(|s: &str| s.parse::<u8>());
///
/// let res = parse.call(("42",)).into_ready().unwrap();
/// assert_eq!(res.into_data(), Some(42));
///
/// let res = parse.call(("nope",)).into_ready().unwrap();
/// assert!(res.is_error());
/// ```
pub fn wrap<F, Args, Marker>(callable: F) -> Wrapped<F, Args, Marker>
where
    F: Callable<Args, Marker>,
{
    Wrapped {
        callable,
        _marker: PhantomData,
    }
}

/// Wraps a callable that returns a plain value.
///
/// The only failure left is a panic, so the error type is [`Infallible`].
///
/// ```
/// use wrap_exception::wrap_infallible;
///
/// let answer = wrap_infallible(|| 42);
///
/// let res = answer.call(()).into_ready().unwrap();
/// assert_eq!(res.into_data(), Some(42));
/// ```
pub fn wrap_infallible<F, Args>(callable: F) -> Wrapped<Plain<F>, Args, Immediate>
where
    Plain<F>: Callable<Args, Immediate>,
{
    wrap(Plain(callable))
}

/// Settles an awaitable value that was obtained without a callable.
pub fn settle<A>(awaitable: A) -> Invocation<A::Future>
where
    A: Awaitable,
{
    match panic::catch_unwind(AssertUnwindSafe(|| awaitable.into_awaitable())) {
        Ok(fut) => Invocation::pending(CallableKind::ReturnsAwaitable, fut),
        Err(payload) => Invocation::failed_setup(CallableKind::ReturnsAwaitable, payload),
    }
}

/// The callable returned by [`wrap`].
pub struct Wrapped<F, Args, Marker> {
    callable: F,
    _marker: PhantomData<fn(Args) -> Marker>,
}

impl<F, Args, Marker> Wrapped<F, Args, Marker>
where
    F: Callable<Args, Marker>,
{
    /// Invokes the wrapped callable once with `args`.
    pub fn call(&self, args: Args) -> Invocation<F::Future> {
        if F::ASYNC {
            trace!("Invoking asynchronous callable");

            return match panic::catch_unwind(AssertUnwindSafe(|| self.callable.invoke(args))) {
                Ok(Either::Right(fut)) => Invocation::pending(CallableKind::Asynchronous, fut),
                Ok(Either::Left(res)) => {
                    Invocation::settled(CallableKind::Asynchronous, res.into())
                }
                Err(payload) => Invocation::failed_setup(CallableKind::Asynchronous, payload),
            };
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.callable.invoke(args))) {
            Ok(Either::Left(res)) => {
                trace!("Callable completed synchronously");

                Invocation::settled(CallableKind::Plain, res.into())
            }
            Ok(Either::Right(fut)) => {
                trace!("Callable returned an awaitable");

                Invocation::pending(CallableKind::ReturnsAwaitable, fut)
            }
            Err(payload) => {
                debug!("Callable panicked");

                Invocation::settled(
                    CallableKind::Plain,
                    WrappedResult::Failure(Caught::Panicked(Panic::new(payload))),
                )
            }
        }
    }

    pub fn into_inner(self) -> F {
        self.callable
    }
}

impl<F, Args, Marker> Clone for Wrapped<F, Args, Marker>
where
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            callable: self.callable.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F, Args, Marker> Debug for Wrapped<F, Args, Marker> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("callable", &std::any::type_name::<F>())
            .finish()
    }
}

/// The outcome of [`Wrapped::call`].
///
/// This always resolves to a [`WrappedResult`] when awaited. Synchronously
/// completed calls can also be read right away with [`Invocation::into_ready`].
///
/// `Fut` is the future of the callable itself, so the invocation borrows
/// whatever that future borrows and is `Send` only if that future is.
#[must_use = "an invocation carries the result of the call"]
pub struct Invocation<Fut>
where
    Fut: TryFuture,
{
    kind: CallableKind,
    state: State<Fut>,
}

enum State<Fut>
where
    Fut: TryFuture,
{
    Settled(Option<WrappedResult<Fut::Ok, Fut::Error>>),
    Pending(CatchUnwind<AssertUnwindSafe<Pin<Box<Fut>>>>),
}

impl<Fut> Invocation<Fut>
where
    Fut: TryFuture,
{
    fn settled(kind: CallableKind, res: WrappedResult<Fut::Ok, Fut::Error>) -> Self {
        Self {
            kind,
            state: State::Settled(Some(res)),
        }
    }

    fn pending(kind: CallableKind, fut: Fut) -> Self {
        Self {
            kind,
            state: State::Pending(AssertUnwindSafe(Box::pin(fut)).catch_unwind()),
        }
    }

    /// A panic while producing the awaitable. The invocation still reports
    /// itself as pending.
    fn failed_setup(kind: CallableKind, payload: Box<dyn std::any::Any + Send>) -> Self {
        debug!("Panicked while producing an awaitable");

        Self::settled(
            kind,
            WrappedResult::Failure(Caught::Panicked(Panic::new(payload))),
        )
    }

    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    /// Returns `true` if the call has to be awaited to get its result.
    pub fn is_pending(&self) -> bool {
        self.kind != CallableKind::Plain
    }

    /// Takes the result of a call that completed synchronously.
    ///
    /// Gives the invocation back if it has to be awaited instead.
    pub fn into_ready(self) -> Result<WrappedResult<Fut::Ok, Fut::Error>, Self> {
        if self.is_pending() {
            return Err(self);
        }

        match self.state {
            State::Settled(Some(res)) => Ok(res),
            state => Err(Self {
                kind: self.kind,
                state,
            }),
        }
    }
}

impl<Fut> Unpin for Invocation<Fut> where Fut: TryFuture {}

impl<Fut> Future for Invocation<Fut>
where
    Fut: TryFuture + Future<Output = Result<<Fut as TryFuture>::Ok, <Fut as TryFuture>::Error>>,
{
    type Output = WrappedResult<Fut::Ok, Fut::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            State::Settled(res) => {
                Poll::Ready(res.take().expect("Invocation polled after completion"))
            }
            State::Pending(fut) => {
                let res = match ready!(fut.poll_unpin(cx)) {
                    Ok(res) => res.into(),
                    Err(payload) => {
                        debug!("Awaitable panicked while settling");

                        WrappedResult::Failure(Caught::Panicked(Panic::new(payload)))
                    }
                };

                Poll::Ready(res)
            }
        }
    }
}

impl<Fut> Debug for Invocation<Fut>
where
    Fut: TryFuture,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
