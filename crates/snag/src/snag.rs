// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::node::{Annotation, Context, KeyedValue, Node};
use crate::render::Report;
use crate::{Opt, StackCapture, stack};

/// An error decorated with context as it travels up the call chain.
///
/// A `Snag` is an immutable chain: each decoration wraps the previous chain in a new link
/// holding exactly one piece of context (a stack snapshot, an annotation, a suppressed error,
/// or a keyed value) and ends at the original, undecorated error, its *cause*. Cloning is cheap
/// and clones share the whole chain.
///
/// `Snag` does not implement [`std::error::Error`] itself so that any error can be converted
/// into it with `?`. Use [`into_std_error`](Self::into_std_error) or [`AsRef`] when a std error
/// is required.
///
/// `Display` prints the cause's message. `Debug` prints the full [report](crate::Report), which
/// makes `fn main() -> Result<(), Snag>` show stacks and annotations on failure.
///
/// # Examples
///
/// ```rust
/// use snag::Snag;
///
/// fn read_config() -> Result<String, Snag> {
///     let contents = std::fs::read_to_string("/definitely/missing.toml")
///         .map_err(|e| Snag::new(e).with_stack().annotate("reading main config"))?;
///     Ok(contents)
/// }
///
/// let err = read_config().unwrap_err();
/// assert!(err.stack().is_some());
/// assert!(err.find_cause::<std::io::Error>().is_some());
/// ```
#[derive(Clone)]
pub struct Snag {
    pub(crate) node: Arc<Node>,
}

impl Snag {
    /// Creates an undecorated error from anything convertible into a boxed std error.
    ///
    /// Passing the std view of a `Snag` (see [`into_std_error`](Self::into_std_error))
    /// recovers the original chain instead of nesting it.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        let error: Box<dyn StdError + Send + Sync + 'static> = error.into();
        match error.downcast::<Arc<Node>>() {
            Ok(node) => Self { node: *node },
            Err(error) => Self {
                node: Arc::new(Node::Plain(error)),
            },
        }
    }

    fn decorate(self, context: Context) -> Self {
        Self {
            node: Arc::new(Node::Decorated { inner: self, context }),
        }
    }

    /// Attaches a stack captured at the caller, unless the chain already has one.
    #[inline(never)]
    #[must_use]
    pub fn with_stack(self) -> Self {
        self.with_stack_using(&StackCapture::new(), 1)
    }

    /// Attaches a stack starting `skip` frames above the caller, unless the chain already
    /// has one.
    ///
    /// The first stack attached to a chain is the one kept: it is the deepest and therefore
    /// the most specific.
    #[inline(never)]
    #[must_use]
    pub fn with_stack_skip(self, skip: usize) -> Self {
        self.with_stack_using(&StackCapture::new(), skip + 1)
    }

    /// Like [`with_stack_skip`](Self::with_stack_skip), with an explicit capture configuration.
    #[inline(never)]
    #[must_use]
    pub fn with_stack_using(self, capture: &StackCapture, skip: usize) -> Self {
        if self.stack().is_some() {
            return self;
        }
        let stack = capture.capture(skip + 1);
        self.decorate(Context::Stack(stack))
    }

    /// Attaches an annotation bound to the calling function.
    #[inline(never)]
    #[must_use]
    pub fn annotate(self, text: impl Into<Cow<'static, str>>) -> Self {
        self.annotate_skip(text, 1)
    }

    /// Attaches an annotation bound to the function `skip` frames above the caller.
    ///
    /// Annotations always accumulate; annotating twice from one function keeps both texts.
    #[inline(never)]
    #[must_use]
    pub fn annotate_skip(self, text: impl Into<Cow<'static, str>>, skip: usize) -> Self {
        let origin = stack::caller_name(skip + 1);
        self.decorate(Context::Annotation(Annotation::new(origin, text)))
    }

    /// Records `suppressed` alongside this error without replacing it.
    #[must_use]
    pub fn with_suppressed(self, suppressed: impl Into<Self>) -> Self {
        self.decorate(Context::Suppressed(suppressed.into()))
    }

    /// Attaches `value` under `key`, unless the chain already holds a value for an equal key.
    ///
    /// The earliest value attached for a key wins.
    #[must_use]
    pub fn with_value<K, V>(self, key: K, value: V) -> Self
    where
        K: Any + PartialEq + fmt::Debug + Send + Sync,
        V: Any + Send + Sync,
    {
        self.with_keyed_value(KeyedValue::new(key, value))
    }

    pub(crate) fn with_keyed_value(self, entry: KeyedValue) -> Self {
        let exists = self
            .contexts()
            .any(|context| matches!(context, Context::Value(existing) if existing.same_key(&entry)));
        if exists { self } else { self.decorate(Context::Value(entry)) }
    }

    /// Applies `opts` left to right, reporting the caller in stacks and annotations.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use snag::{Opt, Snag};
    ///
    /// let err = Snag::new("connection reset").wrap([
    ///     Opt::stack(),
    ///     Opt::annotation("syncing inventory"),
    ///     Opt::value("attempt", 3_u32),
    /// ]);
    ///
    /// assert_eq!(err.find_value::<_, u32>(&"attempt"), Some(&3));
    /// ```
    #[inline(never)]
    #[must_use]
    pub fn wrap(self, opts: impl IntoIterator<Item = Opt>) -> Self {
        self.wrap_skip(1, opts)
    }

    /// Like [`wrap`](Self::wrap), skipping `skip` additional frames.
    ///
    /// Useful inside helpers that should not appear in stacks or annotation origins.
    #[inline(never)]
    #[must_use]
    pub fn wrap_skip(self, skip: usize, opts: impl IntoIterator<Item = Opt>) -> Self {
        let mut snag = self;
        for opt in opts {
            snag = opt.apply(snag, skip + 1);
        }
        snag
    }

    /// Converts this error into a boxed std error.
    ///
    /// The std error displays the cause's message and reports the cause's source. Converting
    /// it back with [`Snag::new`] yields the original chain with all of its context.
    #[must_use]
    pub fn into_std_error(self) -> Box<dyn StdError + Send + Sync + 'static> {
        Box::new(self.node)
    }

    /// Returns a display adapter printing the full report.
    #[must_use]
    pub fn report(&self) -> Report<'_> {
        Report::new(self)
    }
}

impl<E> From<E> for Snag
where
    E: Into<Box<dyn StdError + Send + Sync + 'static>>,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl AsRef<dyn StdError + Send + Sync> for Snag {
    fn as_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &self.node
    }
}

impl fmt::Display for Snag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.cause(), f)
    }
}

impl fmt::Debug for Snag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the report reads better than a struct dump when `main` returns `Result<_, Snag>`
        fmt::Display::fmt(&self.report(), f)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_cause_message() {
        let err = Snag::new("boom").with_stack().annotate("while testing");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn decorations_never_mutate_the_original() {
        let original = Snag::new("boom");
        let decorated = original.clone().annotate("note").with_value("k", 1);
        assert_eq!(original.contexts().count(), 0);
        assert_eq!(decorated.contexts().count(), 2);
    }

    #[test]
    fn std_view_round_trips() {
        let err = Snag::new("boom").with_value("id", 9_u8);
        let std_error = err.clone().into_std_error();
        assert_eq!(std_error.to_string(), "boom");

        let back = Snag::new(std_error);
        assert!(Arc::ptr_eq(&back.node, &err.node));
        assert_eq!(back.find_value::<_, u8>(&"id"), Some(&9));
    }

    #[test]
    fn as_ref_exposes_transparent_std_error() {
        let io = std::io::Error::other("inner");
        let err = Snag::new(io).with_stack();
        let std_error: &(dyn StdError + Send + Sync) = err.as_ref();
        assert_eq!(std_error.to_string(), "inner");
    }

    #[test]
    fn question_mark_converts_foreign_errors() {
        fn parse() -> Result<u8, Snag> {
            Ok("not a number".parse::<u8>()?)
        }
        let err = parse().unwrap_err();
        assert!(err.find_cause::<std::num::ParseIntError>().is_some());
    }

    #[test]
    fn keyed_value_is_first_write_wins() {
        let err = Snag::new("boom").with_value("k", "a").with_value("k", "b");
        assert_eq!(err.find_value::<_, &str>(&"k"), Some(&"a"));
        assert_eq!(err.contexts().count(), 1);
    }

    #[test]
    fn suppressed_always_accumulates() {
        let err = Snag::new("boom").with_suppressed("one").with_suppressed("two");
        assert_eq!(err.contexts().count(), 2);
    }

    #[test]
    fn debug_prints_report() {
        let err = Snag::new("boom");
        assert_eq!(format!("{err:?}"), "ERROR:\nboom\n");
    }
}
