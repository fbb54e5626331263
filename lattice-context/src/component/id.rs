//! Component identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a mounted component.
///
/// Every component record gets a fresh ID when it is created. The render
/// queue is keyed by this ID, so requesting a render never needs to hold on
/// to the component itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Generate a new unique component ID.
    ///
    /// Uses an atomic counter so IDs stay unique even when several runtimes
    /// live on different threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}
