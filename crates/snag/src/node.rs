// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::mem;
use std::sync::{Arc, LazyLock};

use crate::{Snag, StackSnapshot};

/// One link of a decorated error chain.
///
/// Nodes are never mutated once built. The std error view of a node is transparent: it
/// displays the root cause and reports the root cause's own source.
pub(crate) enum Node {
    Plain(Box<dyn StdError + Send + Sync + 'static>),
    Decorated { inner: Snag, context: Context },
}

impl Node {
    /// Returns the terminal (undecorated) node of the chain.
    pub(crate) fn root(&self) -> &Self {
        let mut node = self;
        while let Self::Decorated { inner, .. } = node {
            node = &inner.node;
        }
        node
    }

    pub(crate) fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        let mut node = self;
        loop {
            match node {
                Self::Plain(error) => return error.as_ref(),
                Self::Decorated { inner, .. } => node = &inner.node,
            }
        }
    }
}

/// Stands in for links taken out of a node that is being dropped.
static DETACHED: LazyLock<Arc<Node>> = LazyLock::new(|| Arc::new(Node::Plain(Box::from("detached"))));

impl Node {
    /// Moves the links held by this node into `pending`, leaving placeholders behind.
    fn detach_into(&mut self, pending: &mut Vec<Arc<Self>>) {
        if let Self::Decorated { inner, context } = self {
            pending.push(mem::replace(&mut inner.node, Arc::clone(&DETACHED)));
            if let Context::Suppressed(suppressed) = context {
                pending.push(mem::replace(&mut suppressed.node, Arc::clone(&DETACHED)));
            }
        }
    }
}

// chains can be arbitrarily long, release them iteratively
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_into(&mut pending);
        while let Some(node) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(node) {
                node.detach_into(&mut pending);
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(error) => f.debug_tuple("Plain").field(error).finish(),
            Self::Decorated { inner, context } => f
                .debug_struct("Decorated")
                .field("context", context)
                .field("inner", &inner.node)
                .finish(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.cause(), f)
    }
}

impl StdError for Node {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause().source()
    }
}

/// A single piece of context carried by one link of a [`Snag`] chain.
#[derive(Debug)]
#[non_exhaustive]
pub enum Context {
    /// The call stack captured when the chain was first given a stack.
    Stack(StackSnapshot),
    /// A note bound to the function that attached it.
    Annotation(Annotation),
    /// A secondary error recorded alongside the primary one.
    Suppressed(Snag),
    /// A value retrievable by key.
    Value(KeyedValue),
}

/// Free-form text bound to the function that attached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    origin: String,
    text: Cow<'static, str>,
}

impl Annotation {
    pub(crate) fn new(origin: String, text: impl Into<Cow<'static, str>>) -> Self {
        Self { origin, text: text.into() }
    }

    /// Returns the demangled name of the function that attached this annotation.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the annotation text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Keys are compared by value; keys of different types never match.
trait DynKey: Any + Send + Sync + fmt::Debug {
    fn eq_key(&self, other: &dyn Any) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl<K> DynKey for K
where
    K: Any + PartialEq + fmt::Debug + Send + Sync,
{
    fn eq_key(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<K>().is_some_and(|other| other == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A key/value pair attached to an error chain.
pub struct KeyedValue {
    key: Box<dyn DynKey>,
    value: Arc<dyn Any + Send + Sync>,
}

impl KeyedValue {
    pub(crate) fn new<K, V>(key: K, value: V) -> Self
    where
        K: Any + PartialEq + fmt::Debug + Send + Sync,
        V: Any + Send + Sync,
    {
        Self {
            key: Box::new(key),
            value: Arc::new(value),
        }
    }

    /// Returns `true` if this entry is stored under a key equal to `key`.
    #[must_use]
    pub fn has_key<K: Any + PartialEq>(&self, key: &K) -> bool {
        self.key.eq_key(key)
    }

    pub(crate) fn same_key(&self, other: &Self) -> bool {
        self.key.eq_key(other.key.as_any())
    }

    /// Returns the value if it is of type `V`.
    #[must_use]
    pub fn value<V: Any>(&self) -> Option<&V> {
        (*self.value).downcast_ref::<V>()
    }

    /// Returns the untyped value.
    #[must_use]
    pub fn value_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }
}

impl fmt::Debug for KeyedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedValue")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
