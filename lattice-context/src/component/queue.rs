//! Render Queue
//!
//! The context system never renders anything itself. When a provider's
//! value changes it hands each affected subscriber to a [`RenderQueue`],
//! and the renderer decides when to flush.
//!
//! [`DirtyQueue`] is the queue used by the runtime when no renderer is
//! plugged in. It keeps dirty components in request order and collapses
//! repeated requests for the same component until the next drain.

use std::cell::{Cell, RefCell};

use indexmap::IndexSet;
use tracing::trace;

use super::ComponentId;

/// Boundary to the renderer's scheduling mechanism.
///
/// `enqueue_render` marks a component dirty and eligible for the next
/// render pass. It must not block, and requesting the same component twice
/// before a flush must have the same effect as requesting it once.
pub trait RenderQueue {
    /// Request a render of the given component.
    fn enqueue_render(&self, component: ComponentId);
}

impl<F> RenderQueue for F
where
    F: Fn(ComponentId),
{
    fn enqueue_render(&self, component: ComponentId) {
        self(component)
    }
}

/// An ordered set of components waiting to render.
#[derive(Debug, Default)]
pub struct DirtyQueue {
    dirty: RefCell<IndexSet<ComponentId>>,
    /// Requests received since creation, including collapsed ones.
    requests: Cell<usize>,
}

impl DirtyQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a component is waiting to render.
    pub fn is_dirty(&self, component: ComponentId) -> bool {
        self.dirty.borrow().contains(&component)
    }

    /// Number of components waiting to render.
    pub fn len(&self) -> usize {
        self.dirty.borrow().len()
    }

    /// Check whether nothing is waiting to render.
    pub fn is_empty(&self) -> bool {
        self.dirty.borrow().is_empty()
    }

    /// Total number of render requests received, duplicates included.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }

    /// Take every dirty component, in the order they were first requested.
    pub fn drain(&self) -> Vec<ComponentId> {
        self.dirty.borrow_mut().drain(..).collect()
    }
}

impl RenderQueue for DirtyQueue {
    fn enqueue_render(&self, component: ComponentId) {
        self.requests.set(self.requests.get() + 1);
        let inserted = self.dirty.borrow_mut().insert(component);
        trace!(%component, inserted, "render requested");
    }
}
