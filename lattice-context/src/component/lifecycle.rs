//! Component Lifecycle
//!
//! A [`Component`] is the runtime record the context system attaches to:
//! its identity, whether it is still in the tree, and what has to happen
//! when it leaves.
//!
//! # Teardown
//!
//! Unmounting runs in two stages:
//!
//! 1. Every [`Subscription`] held by the component is released. This
//!    removes the component from the subscriber lists of the providers it
//!    listens to.
//! 2. The teardown callbacks registered with [`Component::on_unmount`] run
//!    in registration order.
//!
//! Registering a new callback appends to the list; it never replaces an
//! earlier one. Subscriptions are released before any callback runs, so a
//! callback that panics cannot leave a stale subscriber behind.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::debug;

use super::ComponentId;
use crate::context::Subscription;

type Teardown = Box<dyn FnOnce()>;

struct ComponentInner {
    id: ComponentId,
    mounted: Cell<bool>,
    subscriptions: RefCell<SmallVec<[Subscription; 2]>>,
    teardown: RefCell<Vec<Teardown>>,
}

/// Runtime record of a mounted component.
///
/// Cloning yields another handle to the same record.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    /// Create a record for a freshly mounted component.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ComponentInner {
                id: ComponentId::new(),
                mounted: Cell::new(true),
                subscriptions: RefCell::new(SmallVec::new()),
                teardown: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get the component's unique ID.
    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    /// Check whether the component is still part of the tree.
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// Register a callback to run when the component unmounts.
    ///
    /// Callbacks run in registration order. On an already unmounted
    /// component the callback is dropped without running.
    pub fn on_unmount<F>(&self, teardown: F)
    where
        F: FnOnce() + 'static,
    {
        if self.is_mounted() {
            self.inner.teardown.borrow_mut().push(Box::new(teardown));
        }
    }

    /// Keep a subscription alive until this component unmounts.
    pub(crate) fn hold(&self, subscription: Subscription) {
        self.inner.subscriptions.borrow_mut().push(subscription);
    }

    /// Number of subscriptions currently held.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }

    /// Remove the component from the tree.
    ///
    /// Releases all subscriptions, then runs the teardown callbacks.
    /// Calling this more than once has no further effect.
    pub fn unmount(&self) {
        if !self.inner.mounted.replace(false) {
            return;
        }

        let subscriptions = mem::take(&mut *self.inner.subscriptions.borrow_mut());
        debug!(
            component = %self.id(),
            subscriptions = subscriptions.len(),
            "unmounting component"
        );
        drop(subscriptions);

        let teardown = mem::take(&mut *self.inner.teardown.borrow_mut());
        for callback in teardown {
            callback();
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id())
            .field("mounted", &self.is_mounted())
            .field("subscriptions", &self.subscription_count())
            .field("teardown", &self.inner.teardown.borrow().len())
            .finish()
    }
}
