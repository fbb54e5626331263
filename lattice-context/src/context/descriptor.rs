//! Context Descriptors
//!
//! A [`ContextDescriptor`] is the identity of one context: what
//! [`create_context`] returns and what both sides of the context refer to.
//! It carries a process-unique [`ContextId`] and the default value seen by
//! consumers with no provider above them.
//!
//! The descriptor hands out the two component kinds of its context:
//!
//! - [`ProviderKind`]: publishes a value for its subtree.
//! - [`ConsumerKind`]: reads the nearest provider's value. It keeps a
//!   back-reference to its descriptor ([`ConsumerKind::context_type`]), so a
//!   reconciler can tell which ambient entry a consumer reads.
//!
//! Descriptors are immutable and cheap to clone. Clones share one identity.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique context IDs.
static CONTEXT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier of a context.
///
/// Used as the key of the ambient child-context mapping. Displayed as
/// `__cC<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Generate a new unique context ID.
    fn next() -> Self {
        Self(CONTEXT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__cC{}", self.0)
    }
}

struct DescriptorInner<T> {
    id: ContextId,
    default_value: T,
}

/// The identity of a context and its default value.
pub struct ContextDescriptor<T: 'static> {
    inner: Rc<DescriptorInner<T>>,
}

/// Create a new context with the given default value.
///
/// Every call allocates a fresh ID; no two descriptors in a process share
/// one.
///
/// # Example
///
/// ```rust
/// use lattice_context::create_context;
///
/// let theme = create_context("light");
/// assert_eq!(*theme.default_value(), "light");
/// assert_eq!(theme.consumer().context_type(), &theme);
/// ```
pub fn create_context<T: 'static>(default_value: T) -> ContextDescriptor<T> {
    let id = ContextId::next();
    tracing::debug!(%id, "context created");
    ContextDescriptor {
        inner: Rc::new(DescriptorInner { id, default_value }),
    }
}

impl<T: 'static> ContextDescriptor<T> {
    /// Get the context's unique ID.
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The value seen by a consumer with no enclosing provider.
    pub fn default_value(&self) -> &T {
        &self.inner.default_value
    }

    /// The consumer component kind of this context.
    pub fn consumer(&self) -> ConsumerKind<T> {
        ConsumerKind {
            context: self.clone(),
        }
    }

    /// The provider component kind of this context.
    pub fn provider(&self) -> ProviderKind<T> {
        ProviderKind {
            context: self.clone(),
        }
    }
}

impl<T: 'static> Clone for ContextDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> PartialEq for ContextDescriptor<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Eq for ContextDescriptor<T> {}

impl<T: fmt::Debug + 'static> fmt::Debug for ContextDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextDescriptor")
            .field("id", &self.id())
            .field("default_value", self.default_value())
            .finish()
    }
}

/// Component kind reading the nearest provider's value.
///
/// Tagged with the descriptor it belongs to.
pub struct ConsumerKind<T: 'static> {
    pub(crate) context: ContextDescriptor<T>,
}

impl<T: 'static> ConsumerKind<T> {
    /// The descriptor this consumer reads from.
    pub fn context_type(&self) -> &ContextDescriptor<T> {
        &self.context
    }
}

/// Component kind publishing a value for its subtree.
pub struct ProviderKind<T: 'static> {
    pub(crate) context: ContextDescriptor<T>,
}

impl<T: 'static> ProviderKind<T> {
    /// The descriptor this provider publishes for.
    pub fn context(&self) -> &ContextDescriptor<T> {
        &self.context
    }
}

macro_rules! kind_impls {
    ($kind:ident) => {
        impl<T: 'static> Clone for $kind<T> {
            fn clone(&self) -> Self {
                Self {
                    context: self.context.clone(),
                }
            }
        }

        impl<T: 'static> PartialEq for $kind<T> {
            fn eq(&self, other: &Self) -> bool {
                self.context == other.context
            }
        }

        impl<T: 'static> fmt::Debug for $kind<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($kind))
                    .field("context", &self.context.id())
                    .finish()
            }
        }
    };
}

kind_impls!(ConsumerKind);
kind_impls!(ProviderKind);
