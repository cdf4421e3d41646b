//! Turns errors and panics of a callable into values.
//!
//! [`wrap`] takes a synchronous or asynchronous callable and returns a
//! [`Wrapped`] callable whose every call yields a [`WrappedResult`]:
//! either `Success(data)` or `Failure(error)`. Nothing escapes the
//! wrapper, neither `Err` values nor panics, and the error is handed over
//! exactly as the callable produced it.
//!
//! ```
//! use wrap_exception::{wrap, Caught};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let fetch = wrap(|id: u32| async move {
//!     if id == 0 {
//!         return Err("no such user");
//!     }
//!     Ok(format!("user-{}", id))
//! });
//!
//! let res = fetch.call((7,)).await;
//! assert_eq!(res.data().map(String::as_str), Some("user-7"));
//!
//! let res = fetch.call((0,)).await;
//! assert!(matches!(res.error(), Some(Caught::Raised("no such user"))));
//! # }
//! ```
//!
//! # Panics
//!
//! Panics are captured with [`std::panic::catch_unwind`], so they only
//! become values when the crate is built with `panic = "unwind"` (the
//! default). With `panic = "abort"` the process still aborts. A captured
//! panic also still runs the panic hook, which prints its message to
//! stderr unless a custom hook is installed.

pub use self::{
    classify::{Awaitable, CallableKind, Classify, Completion, Deferred},
    result::{Caught, Panic, WrappedResult},
    wrap::{
        settle, wrap, wrap_infallible, Asynchronous, Callable, Immediate, Invocation, Plain,
        Wrapped,
    },
};

mod classify;
mod result;
mod wrap;
