// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Raising decorated errors as unwinds and intercepting them further up.
//!
//! [`check`] and friends turn a failed [`Result`] into a [`Signal`] unwind. The nearest enclosing
//! [`Handler`] (or [`catch`]) intercepts the signal and hands the error to its callback. Panics
//! that are not signals pass through handlers untouched.
//!
//! Signals are raised with [`std::panic::resume_unwind`], so the panic hook does not run and
//! nothing is printed when a handler intercepts them. A signal raised without an enclosing
//! handler unwinds to the thread root like any uncaught panic, silently: wrap the thread's work in
//! [`catch`] to report it.
//!
//! # Examples
//!
//! ```rust
//! use snag::{Handler, check};
//!
//! fn parse_port(raw: &str) -> u16 {
//!     check(raw.parse::<u16>())
//! }
//!
//! let mut failure = None;
//! let port = Handler::store_into(&mut failure).run(|| parse_port("http"));
//!
//! assert_eq!(port, None);
//! assert!(failure.is_some_and(|err| err.stack().is_some()));
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{Level, event};

use crate::{Opt, Snag};

/// The unwind payload carrying a raised error.
///
/// Only visible to code that inspects panic payloads directly, for example through
/// [`std::panic::catch_unwind`].
pub struct Signal(Snag);

impl Signal {
    /// Returns the raised error.
    #[must_use]
    pub fn snag(&self) -> &Snag {
        &self.0
    }

    /// Consumes the signal, returning the raised error.
    #[must_use]
    pub fn into_snag(self) -> Snag {
        self.0
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

/// Returns the success value, or raises the error with a stack captured at the caller.
///
/// # Panics
///
/// Raises a [`Signal`] unwind when `result` is `Err`. The panic hook is skipped, so a signal that
/// no [`Handler`] intercepts ends its thread without printing anything. The payload handed to
/// [`JoinHandle::join`](std::thread::JoinHandle::join) is the [`Signal`], and its `Debug` output
/// is the full report of the error. Run the thread's work inside [`catch`] to report it.
///
/// The other `check` functions raise the same way.
#[inline(never)]
pub fn check<T, E: Into<Snag>>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => raise(error.into(), 1, Vec::new(), true),
    }
}

/// Like [`check`], applying `opts` before the stack is attached.
///
/// # Examples
///
/// ```rust
/// use snag::{Opt, catch, check_with};
///
/// let err = catch(|| check_with(Err::<(), _>("denied"), [Opt::value("user", 7_u32)])).unwrap_err();
///
/// assert_eq!(err.find_value::<_, u32>(&"user"), Some(&7));
/// ```
#[inline(never)]
pub fn check_with<T, E: Into<Snag>>(result: Result<T, E>, opts: impl IntoIterator<Item = Opt>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => raise(error.into(), 1, opts.into_iter().collect(), true),
    }
}

/// Raises the error produced by `error` if `condition` holds.
///
/// The error is only built when it is raised.
#[inline(never)]
pub fn check_if<E: Into<Snag>>(condition: bool, error: impl FnOnce() -> E) {
    if condition {
        raise(error().into(), 1, Vec::new(), true);
    }
}

/// Like [`check_if`], applying `opts` before the stack is attached.
#[inline(never)]
pub fn check_if_with<E: Into<Snag>>(condition: bool, error: impl FnOnce() -> E, opts: impl IntoIterator<Item = Opt>) {
    if condition {
        raise(error().into(), 1, opts.into_iter().collect(), true);
    }
}

/// Like [`check`], without attaching a stack.
#[inline(never)]
pub fn check_no_stack<T, E: Into<Snag>>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => raise(error.into(), 1, Vec::new(), false),
    }
}

/// Like [`check_if`], without attaching a stack.
#[inline(never)]
pub fn check_if_no_stack<E: Into<Snag>>(condition: bool, error: impl FnOnce() -> E) {
    if condition {
        raise(error().into(), 1, Vec::new(), false);
    }
}

#[inline(never)]
fn raise(snag: Snag, skip: usize, opts: Vec<Opt>, with_stack: bool) -> ! {
    let mut snag = snag.wrap_skip(skip + 1, opts);
    if with_stack {
        snag = snag.with_stack_skip(skip + 1);
    }

    event!(Level::TRACE, error = %snag, "raising signal");
    panic::resume_unwind(Box::new(Signal(snag)))
}

fn intercept<T>(body: impl FnOnce() -> T) -> Result<T, Snag> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<Signal>() {
            Ok(signal) => {
                event!(Level::DEBUG, error = %signal.0, "signal intercepted");
                Err(signal.into_snag())
            }
            Err(payload) => {
                event!(Level::TRACE, "forwarding foreign panic");
                panic::resume_unwind(payload)
            }
        },
    }
}

/// Runs a body and intercepts signals raised by [`check`] inside it.
///
/// When the body completes, every continuation registered with [`then`](Self::then) runs once
/// in registration order. When the body raises a signal, the error goes to the signal callback
/// and no continuation runs. Any other panic is resumed unchanged.
///
/// # Examples
///
/// ```rust
/// use std::cell::Cell;
///
/// use snag::{Handler, check_if};
///
/// let flushed = Cell::new(false);
/// let result = Handler::new(|err| panic!("unexpected: {err}"))
///     .then(|| flushed.set(true))
///     .run(|| {
///         check_if(false, || "never raised");
///         42
///     });
///
/// assert_eq!(result, Some(42));
/// assert!(flushed.get());
/// ```
pub struct Handler<'a> {
    on_signal: Box<dyn FnOnce(Snag) + 'a>,
    continuations: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a> Handler<'a> {
    /// Creates a handler passing intercepted errors to `on_signal`.
    #[must_use]
    pub fn new(on_signal: impl FnOnce(Snag) + 'a) -> Self {
        Self {
            on_signal: Box::new(on_signal),
            continuations: Vec::new(),
        }
    }

    /// Creates a handler storing the intercepted error into `slot`.
    #[must_use]
    pub fn store_into(slot: &'a mut Option<Snag>) -> Self {
        Self::new(move |snag| *slot = Some(snag))
    }

    /// Registers a continuation to run when the body completes without raising.
    #[must_use]
    pub fn then(mut self, continuation: impl FnOnce() + 'a) -> Self {
        self.continuations.push(Box::new(continuation));
        self
    }

    /// Runs `body`, returning its value unless a signal was intercepted.
    pub fn run<T>(self, body: impl FnOnce() -> T) -> Option<T> {
        match intercept(body) {
            Ok(value) => {
                for continuation in self.continuations {
                    continuation();
                }
                Some(value)
            }
            Err(snag) => {
                (self.on_signal)(snag);
                None
            }
        }
    }
}

impl fmt::Debug for Handler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("continuations", &self.continuations.len())
            .finish_non_exhaustive()
    }
}

/// Runs `body`, turning an intercepted signal into `Err`.
///
/// Behaves like [`Handler::store_into`] without continuations.
///
/// # Examples
///
/// ```rust
/// use snag::{catch, check};
///
/// let err = catch(|| check("x1".parse::<i32>())).unwrap_err();
/// assert_eq!(err.to_string(), "invalid digit found in string");
/// ```
pub fn catch<T>(body: impl FnOnce() -> T) -> Result<T, Snag> {
    intercept(body)
}
