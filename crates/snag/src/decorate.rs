// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use crate::{Opt, Snag};

/// Decoration for values that may or may not hold an error.
///
/// Implemented for `Option<Snag>` and `Result<T, Snag>`: decorating `None` or `Ok` returns the
/// value untouched, decorating `Some` or `Err` decorates the error inside. Stacks and
/// annotations report the caller of the decorating method.
///
/// # Examples
///
/// ```rust
/// use snag::{Decorate, Snag};
///
/// fn lookup(id: u32) -> Result<&'static str, Snag> {
///     if id == 0 { Err(Snag::new("no such user")) } else { Ok("ada") }
/// }
///
/// assert_eq!(lookup(1).annotate("loading profile").unwrap(), "ada");
///
/// let err = lookup(0).with_value("id", 0_u32).unwrap_err();
/// assert_eq!(err.find_value::<_, u32>(&"id"), Some(&0));
/// ```
pub trait Decorate: Sized {
    /// Applies `opts` to the error, if any, reporting the function `skip` frames above the caller.
    #[must_use]
    fn wrap_skip(self, skip: usize, opts: impl IntoIterator<Item = Opt>) -> Self;

    /// Applies `opts` to the error, if any.
    #[inline(never)]
    #[must_use]
    fn wrap(self, opts: impl IntoIterator<Item = Opt>) -> Self {
        self.wrap_skip(1, opts)
    }

    /// Attaches a stack captured at the caller, unless the error already carries one.
    #[inline(never)]
    #[must_use]
    fn with_stack(self) -> Self {
        self.wrap_skip(1, [Opt::stack()])
    }

    /// Attaches an annotation bound to the calling function.
    #[inline(never)]
    #[must_use]
    fn annotate(self, text: impl Into<Cow<'static, str>>) -> Self {
        self.wrap_skip(1, [Opt::annotation(text)])
    }

    /// Records `suppressed` alongside the error.
    #[must_use]
    fn with_suppressed(self, suppressed: impl Into<Snag>) -> Self {
        self.wrap_skip(0, [Opt::suppressed(suppressed)])
    }

    /// Attaches a keyed value; first write wins.
    #[must_use]
    fn with_value<K, V>(self, key: K, value: V) -> Self
    where
        K: Any + PartialEq + fmt::Debug + Send + Sync,
        V: Any + Send + Sync,
    {
        self.wrap_skip(0, [Opt::value(key, value)])
    }
}

impl Decorate for Option<Snag> {
    #[inline(never)]
    #[expect(clippy::manual_map, reason = "a closure would add an unaccounted frame to captured stacks")]
    fn wrap_skip(self, skip: usize, opts: impl IntoIterator<Item = Opt>) -> Self {
        match self {
            Some(snag) => Some(snag.wrap_skip(skip + 1, opts)),
            None => None,
        }
    }
}

impl<T> Decorate for Result<T, Snag> {
    #[inline(never)]
    fn wrap_skip(self, skip: usize, opts: impl IntoIterator<Item = Opt>) -> Self {
        match self {
            Ok(value) => Ok(value),
            Err(snag) => Err(snag.wrap_skip(skip + 1, opts)),
        }
    }
}

/// Converts the error of a [`Result`] into a [`Snag`].
///
/// # Examples
///
/// ```rust
/// use snag::{Decorate, IntoSnag};
///
/// let err = "12a".parse::<u8>().into_snag().annotate("parsing retry count").unwrap_err();
/// assert_eq!(err.annotations().len(), 1);
/// ```
pub trait IntoSnag<T> {
    /// Converts the error, leaving a success value untouched.
    ///
    /// # Errors
    ///
    /// Returns the converted error if `self` is `Err`.
    fn into_snag(self) -> Result<T, Snag>;
}

impl<T, E: Into<Snag>> IntoSnag<T> for Result<T, E> {
    fn into_snag(self) -> Result<T, Snag> {
        self.map_err(Into::into)
    }
}
