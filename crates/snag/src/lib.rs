// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Errors decorated with context as they travel up the call chain.
//!
//! A [`Snag`] wraps any error and accumulates context without ever mutating it:
//!
//! - a call stack, captured once per chain ([`Snag::with_stack`]),
//! - annotations bound to the function that attached them ([`Snag::annotate`]),
//! - suppressed errors recorded next to the primary one ([`Snag::with_suppressed`]),
//! - typed values retrievable by key ([`Snag::with_value`]).
//!
//! Context is read back with accessors such as [`Snag::stack`], [`Snag::annotations`],
//! [`Snag::suppressed`] and [`Snag::find_value`], and printed as a full report with
//! [`render()`] or `{:?}`.
//!
//! # Quick Start
//!
//! ```rust
//! use snag::{Opt, Snag};
//!
//! fn load_profile(user: u32) -> Result<String, Snag> {
//!     std::fs::read_to_string(format!("/profiles/{user}.toml")).map_err(|e| {
//!         Snag::new(e).wrap([
//!             Opt::stack(),
//!             Opt::annotation("reading profile from disk"),
//!             Opt::value("user", user),
//!         ])
//!     })
//! }
//!
//! let err = load_profile(42).unwrap_err();
//!
//! assert_eq!(err.find_value::<_, u32>(&"user"), Some(&42));
//! assert!(err.find_cause::<std::io::Error>().is_some());
//! assert!(snag::render(&err).starts_with("ERROR:\n"));
//! ```
//!
//! # Merge Rules
//!
//! Decorating twice with the same kind of context behaves differently per kind:
//!
//! | Context    | Repeated decoration                               |
//! |------------|---------------------------------------------------|
//! | Stack      | ignored, the first (deepest) stack is kept         |
//! | Annotation | accumulated, texts of one function are joined      |
//! | Value      | ignored for an equal key, the first value is kept  |
//! | Suppressed | accumulated, listed most recent first              |
//!
//! # Check and Handle
//!
//! [`check()`] raises a failed [`Result`] as an unwind that the nearest [`Handler`] or [`catch`]
//! intercepts, so deep call chains can bail out without threading `?` through every level.
//! Panics that were not raised by `check` pass through handlers untouched.
//!
//! ```rust
//! use snag::{catch, check, check_if};
//!
//! fn withdraw(balance: u64, amount: u64) -> u64 {
//!     check_if(amount > balance, || "insufficient funds");
//!     balance - amount
//! }
//!
//! assert_eq!(catch(|| withdraw(10, 3)).unwrap(), 7);
//!
//! let err = catch(|| withdraw(1, 3)).unwrap_err();
//! assert_eq!(err.to_string(), "insufficient funds");
//! ```
//!
//! # Optional Values
//!
//! The [`Decorate`] trait brings the same decorations to `Option<Snag>` and `Result<T, Snag>`,
//! leaving `None` and `Ok` untouched.

mod access;
mod check;
mod decorate;
mod helpers;
mod macros;
mod node;
mod render;
mod snag;
mod stack;
mod wrap;

#[cfg(any(feature = "test-util", test))]
pub mod test_util;

pub use access::{Annotations, Contexts, same_cause};
pub use check::{Handler, Signal, catch, check, check_if, check_if_no_stack, check_if_with, check_no_stack, check_with};
pub use decorate::{Decorate, IntoSnag};
pub use helpers::{first_err, first_failure};
pub use node::{Annotation, Context, KeyedValue};
pub use render::{Report, render};
pub use snag::Snag;
pub use stack::{DEFAULT_MAX_DEPTH, Frame, ResolvedFrame, StackCapture, StackSnapshot};
pub use wrap::Opt;
