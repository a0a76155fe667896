// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lookups over a decorated error chain.
//!
//! Every lookup walks the chain from the outermost link inwards. When the cause is a foreign
//! error that itself wraps a [`Snag`] (for example through [`Opt::map`](crate::Opt::map)), the
//! walk continues through the foreign error's `source()` chain.

use std::any::Any;
use std::error::Error as StdError;
use std::iter;

use crate::node::Node;
use crate::{Context, Snag, StackSnapshot};

impl Snag {
    /// Iterates over every piece of context, outermost first.
    #[must_use]
    pub fn contexts(&self) -> Contexts<'_> {
        Contexts { next: Some(&*self.node) }
    }

    /// Returns the stack attached to this chain, if any.
    #[must_use]
    pub fn stack(&self) -> Option<&StackSnapshot> {
        self.contexts().find_map(|context| match context {
            Context::Stack(stack) => Some(stack),
            _ => None,
        })
    }

    /// Returns the annotations grouped by the function that attached them.
    ///
    /// Texts attached by one function are newline-joined in attachment order; functions are
    /// listed in the order they first annotated the chain.
    #[must_use]
    pub fn annotations(&self) -> Annotations {
        let found: Vec<_> = self
            .contexts()
            .filter_map(|context| match context {
                Context::Annotation(annotation) => Some(annotation),
                _ => None,
            })
            .collect();

        let mut annotations = Annotations::default();
        for annotation in found.into_iter().rev() {
            annotations.push(annotation.origin(), annotation.text());
        }
        annotations
    }

    /// Returns every suppressed error, most recently attached first.
    #[must_use]
    pub fn suppressed(&self) -> Vec<&Self> {
        self.contexts()
            .filter_map(|context| match context {
                Context::Suppressed(suppressed) => Some(suppressed),
                _ => None,
            })
            .collect()
    }

    /// Returns the value stored under `key`, if present and of type `V`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use snag::Snag;
    ///
    /// let err = Snag::new("not found").with_value("user_id", 17_u64);
    ///
    /// assert_eq!(err.find_value::<_, u64>(&"user_id"), Some(&17));
    /// assert_eq!(err.find_value::<_, u64>(&"tenant"), None);
    /// ```
    #[must_use]
    pub fn find_value<K, V>(&self, key: &K) -> Option<&V>
    where
        K: Any + PartialEq,
        V: Any,
    {
        self.find_value_any(key).and_then(|value| value.downcast_ref::<V>())
    }

    /// Returns the untyped value stored under `key`, if present.
    #[must_use]
    pub fn find_value_any<K>(&self, key: &K) -> Option<&(dyn Any + Send + Sync)>
    where
        K: Any + PartialEq,
    {
        self.contexts().find_map(|context| match context {
            Context::Value(entry) if entry.has_key(key) => Some(entry.value_any()),
            _ => None,
        })
    }

    /// Returns the innermost, undecorated error.
    #[must_use]
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        Node::cause(&self.node)
    }

    /// Finds the first error of type `T` among the cause and the cause's sources.
    #[must_use]
    pub fn find_cause<T: StdError + 'static>(&self) -> Option<&T> {
        let cause: &(dyn StdError + 'static) = self.cause();
        iter::successors(Some(cause), |error| (*error).source()).find_map(|error| error.downcast_ref::<T>())
    }

    /// Returns `true` if both chains end at the very same cause, regardless of context.
    #[must_use]
    pub fn is_same_cause(&self, other: &Self) -> bool {
        std::ptr::eq(self.node.root(), other.node.root())
    }
}

/// Returns `true` if `a` and `b` end at the very same cause.
#[must_use]
pub fn same_cause(a: &Snag, b: &Snag) -> bool {
    a.is_same_cause(b)
}

/// Iterator over the context of a [`Snag`], outermost first.
///
/// Created by [`Snag::contexts`].
#[derive(Debug, Clone)]
pub struct Contexts<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Contexts<'a> {
    type Item = &'a Context;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next? {
                Node::Decorated { inner, context } => {
                    self.next = Some(&*inner.node);
                    return Some(context);
                }
                Node::Plain(error) => self.next = nested(&**error),
            }
        }
    }
}

/// Finds a chain hidden in the `source()` chain of a foreign error.
fn nested<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a Node> {
    iter::successors(error.source(), |error| (*error).source())
        .find_map(|error| error.downcast_ref::<std::sync::Arc<Node>>())
        .map(|node| &**node)
}

/// Annotations grouped by originating function.
///
/// Returned by [`Snag::annotations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: Vec<(String, String)>,
}

impl Annotations {
    fn push(&mut self, origin: &str, text: &str) {
        match self.entries.iter_mut().find(|(existing, _)| existing == origin) {
            Some((_, accumulated)) => {
                accumulated.push('\n');
                accumulated.push_str(text);
            }
            None => self.entries.push((origin.to_owned(), text.to_owned())),
        }
    }

    /// Returns the accumulated text attached by `function`.
    #[must_use]
    pub fn get(&self, function: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(origin, _)| origin == function)
            .map(|(_, text)| text.as_str())
    }

    /// Iterates over `(function, text)` pairs in first-attachment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(origin, text)| (origin.as_str(), text.as_str()))
    }

    /// Returns the number of annotating functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chain carries no annotation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
