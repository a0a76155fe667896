// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use crate::node::KeyedValue;
use crate::{Snag, StackCapture};

/// One step of a [`Snag::wrap`] pipeline.
///
/// Options are applied left to right. Stack and annotation options report the function that
/// called `wrap`, not the helpers in between.
///
/// # Examples
///
/// ```rust
/// use snag::{Opt, Snag};
///
/// let err = Snag::new("timeout").wrap([
///     Opt::annotation("calling billing"),
///     Opt::suppressed(Snag::new("cleanup failed too")),
///     Opt::stack(),
/// ]);
///
/// assert_eq!(err.suppressed().len(), 1);
/// ```
pub struct Opt(Step);

enum Step {
    Stack(StackCapture),
    Annotation(Cow<'static, str>),
    Suppressed(Snag),
    Value(KeyedValue),
    Map(Box<dyn FnOnce(Snag) -> Snag + Send>),
}

impl Opt {
    /// Attaches a stack with the default capture configuration.
    #[must_use]
    pub fn stack() -> Self {
        Self(Step::Stack(StackCapture::new()))
    }

    /// Attaches a stack using `capture`.
    #[must_use]
    pub fn stack_with(capture: StackCapture) -> Self {
        Self(Step::Stack(capture))
    }

    /// Attaches an annotation bound to the caller of `wrap`.
    #[must_use]
    pub fn annotation(text: impl Into<Cow<'static, str>>) -> Self {
        Self(Step::Annotation(text.into()))
    }

    /// Records a suppressed error.
    #[must_use]
    pub fn suppressed(suppressed: impl Into<Snag>) -> Self {
        Self(Step::Suppressed(suppressed.into()))
    }

    /// Attaches a keyed value; first write wins.
    #[must_use]
    pub fn value<K, V>(key: K, value: V) -> Self
    where
        K: Any + PartialEq + fmt::Debug + Send + Sync,
        V: Any + Send + Sync,
    {
        Self(Step::Value(KeyedValue::new(key, value)))
    }

    /// Runs an arbitrary transformation, such as wrapping the chain in a foreign error type.
    #[must_use]
    pub fn map(f: impl FnOnce(Snag) -> Snag + Send + 'static) -> Self {
        Self(Step::Map(Box::new(f)))
    }

    #[inline(never)]
    pub(crate) fn apply(self, snag: Snag, skip: usize) -> Snag {
        match self.0 {
            Step::Stack(capture) => snag.with_stack_using(&capture, skip + 1),
            Step::Annotation(text) => snag.annotate_skip(text, skip + 1),
            Step::Suppressed(suppressed) => snag.with_suppressed(suppressed),
            Step::Value(entry) => snag.with_keyed_value(entry),
            Step::Map(f) => f(snag),
        }
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Step::Stack(capture) => f.debug_tuple("Stack").field(capture).finish(),
            Step::Annotation(text) => f.debug_tuple("Annotation").field(text).finish(),
            Step::Suppressed(suppressed) => f.debug_tuple("Suppressed").field(&suppressed.to_string()).finish(),
            Step::Value(entry) => f.debug_tuple("Value").field(entry).finish(),
            Step::Map(_) => f.write_str("Map(..)"),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use super::*;
    use crate::Context;

    #[derive(Debug, thiserror::Error)]
    #[error("wrapped: {0}")]
    struct Wrapped(#[source] Box<dyn StdError + Send + Sync>);

    #[test]
    fn empty_pipeline_is_identity() {
        let err = Snag::new("eof");
        let wrapped = err.clone().wrap([]);
        assert!(wrapped.is_same_cause(&err));
        assert_eq!(wrapped.contexts().count(), 0);
    }

    #[test]
    fn options_apply_left_to_right() {
        let err = Snag::new("eof").wrap([Opt::value("a", 1), Opt::annotation("note"), Opt::stack()]);
        let kinds: Vec<_> = err
            .contexts()
            .map(|context| match context {
                Context::Stack(_) => "stack",
                Context::Annotation(_) => "annotation",
                Context::Value(_) => "value",
                Context::Suppressed(_) => "suppressed",
            })
            .collect();
        // outermost first
        assert_eq!(kinds, ["stack", "annotation", "value"]);
    }

    #[test]
    fn repeated_stack_option_keeps_one_stack() {
        let err = Snag::new("eof").wrap([Opt::suppressed("no rows"), Opt::stack(), Opt::annotation("x"), Opt::stack()]);
        let stacks = err.contexts().filter(|context| matches!(context, Context::Stack(_))).count();
        assert_eq!(stacks, 1);
        assert_eq!(err.suppressed()[0].to_string(), "no rows");
    }

    #[test]
    fn mapped_foreign_wrapper_keeps_context_reachable() {
        let err = Snag::new("eof").wrap([
            Opt::value("a", "b"),
            Opt::annotation("note"),
            Opt::stack(),
            Opt::map(|inner| Snag::new(Wrapped(inner.into_std_error()))),
        ]);

        assert_eq!(err.to_string(), "wrapped: eof");
        assert_eq!(err.find_value::<_, &str>(&"a"), Some(&"b"));
        assert!(err.stack().is_some());
        assert_eq!(err.annotations().len(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn annotation_origin_is_caller_of_wrap() {
        let err = Snag::new("eof").wrap([Opt::annotation("here")]);
        let annotations = err.annotations();
        let (origin, text) = annotations.iter().next().unwrap();
        assert!(origin.ends_with("annotation_origin_is_caller_of_wrap"), "got {origin}");
        assert_eq!(text, "here");
    }

    #[test]
    fn debug_names_each_step() {
        let opts = [
            Opt::stack(),
            Opt::annotation("a"),
            Opt::suppressed("s"),
            Opt::value("k", 1),
            Opt::map(|snag| snag),
        ];
        let rendered: Vec<_> = opts.iter().map(|opt| format!("{opt:?}")).collect();
        assert_eq!(rendered[0], "Stack(StackCapture { max_depth: 32 })");
        assert_eq!(rendered[1], r#"Annotation("a")"#);
        assert_eq!(rendered[2], r#"Suppressed("s")"#);
        assert_eq!(rendered[3], r#"Value(KeyedValue { key: "k", .. })"#);
        assert_eq!(rendered[4], "Map(..)");
    }
}
