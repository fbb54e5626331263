//! Subscriber Registry
//!
//! Each provider keeps an ordered list of the consumers that asked to be
//! re-rendered when its value changes. The list is owned by the provider;
//! the subscribing component only owns a [`Subscription`], the capability
//! to remove its own entry.
//!
//! # Removal
//!
//! Entries are keyed by a per-list monotonic [`EntryKey`], so a
//! subscription removes exactly the entry it created and nothing else.
//! Removing a key that is already gone is a no-op, which makes a double
//! teardown harmless.
//!
//! # Re-entrancy
//!
//! A notification pass works on a [`snapshot`](SubscriberList::snapshot)
//! of the list and checks [`contains`](SubscriberList::contains) before
//! delivering to each entry. Teardown code that runs during the pass can
//! remove entries freely: the snapshot keeps the visiting order stable and
//! the liveness check keeps removed entries from being notified.
//!
//! # Ownership
//!
//! Entries reference their consumer weakly. A consumer whose last handle was
//! dropped without unmounting is never notified again, and its entry is
//! [pruned](SubscriberList::prune) by the next pass or subscription.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use super::consumer::{ConsumerHandle, WeakConsumer};
use crate::component::ComponentId;

/// Comparison function deciding whether a subscriber must re-render.
///
/// Called as `should_update(next, previous)`. Returning `false` keeps the
/// subscriber's observed value current without scheduling a render.
pub type ShouldUpdate<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Key of one entry in a provider's subscriber list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(u64);

/// One registered subscriber.
pub(crate) struct Entry<T: 'static> {
    component: ComponentId,
    consumer: WeakConsumer<T>,
    should_update: Option<ShouldUpdate<T>>,
}

impl<T: 'static> Entry<T> {
    pub(crate) fn new(
        handle: &ConsumerHandle<T>,
        should_update: Option<ShouldUpdate<T>>,
    ) -> Self {
        Self {
            component: handle.id(),
            consumer: handle.downgrade(),
            should_update,
        }
    }

    fn is_alive(&self) -> bool {
        self.consumer.is_alive()
    }
}

impl<T: 'static> fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("component", &self.component)
            .field("alive", &self.is_alive())
            .field("conditional", &self.should_update.is_some())
            .finish()
    }
}

/// A live subscriber as seen by a notification pass.
pub(crate) type Visit<T> = (EntryKey, ConsumerHandle<T>, Option<ShouldUpdate<T>>);

/// The live subscribers at the start of a notification pass, in order.
pub(crate) type Snapshot<T> = SmallVec<[Visit<T>; 8]>;

/// Ordered subscriber list of one provider instance.
pub(crate) struct SubscriberList<T: 'static> {
    entries: IndexMap<EntryKey, Entry<T>>,
    /// Reverse index, one entry per subscribed component.
    by_component: HashMap<ComponentId, EntryKey>,
    next_key: u64,
}

impl<T: 'static> SubscriberList<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
            by_component: HashMap::with_capacity(capacity),
            next_key: 0,
        }
    }

    /// Append an entry.
    ///
    /// Hands the entry back when its component is already subscribed; the
    /// existing entry is left untouched.
    pub(crate) fn insert(&mut self, entry: Entry<T>) -> Result<EntryKey, Entry<T>> {
        if self.by_component.contains_key(&entry.component) {
            return Err(entry);
        }

        let key = EntryKey(self.next_key);
        self.next_key += 1;
        self.by_component.insert(entry.component, key);
        self.entries.insert(key, entry);
        Ok(key)
    }

    /// Remove the entry with the given key, keeping the order of the rest.
    pub(crate) fn remove(&mut self, key: EntryKey) -> Option<Entry<T>> {
        let entry = self.entries.shift_remove(&key)?;
        self.by_component.remove(&entry.component);
        Some(entry)
    }

    /// Remove every entry whose consumer handle is gone.
    ///
    /// The removed entries are returned so the caller can drop them after
    /// releasing its borrow.
    pub(crate) fn prune(&mut self) -> Vec<Entry<T>> {
        let dead: SmallVec<[EntryKey; 4]> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_alive())
            .map(|(key, _)| *key)
            .collect();

        dead.into_iter().filter_map(|key| self.remove(key)).collect()
    }

    pub(crate) fn contains(&self, key: EntryKey) -> bool {
        self.entries.get(&key).is_some_and(|entry| entry.is_alive())
    }

    pub(crate) fn contains_component(&self, component: ComponentId) -> bool {
        self.by_component
            .get(&component)
            .is_some_and(|key| self.contains(*key))
    }

    /// Number of live subscribers.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_alive()).count()
    }

    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| {
                let handle = entry.consumer.upgrade()?;
                Some((*key, handle, entry.should_update.clone()))
            })
            .collect()
    }

    /// Live components in subscription order.
    pub(crate) fn components(&self) -> Vec<ComponentId> {
        self.entries
            .values()
            .filter(|entry| entry.is_alive())
            .map(|entry| entry.component)
            .collect()
    }
}

/// Type-erased removal side of a subscriber list.
///
/// Lets a [`Component`](crate::component::Component) hold subscriptions to
/// providers of different value types.
pub(crate) trait Detach {
    fn detach(&self, key: EntryKey);
}

impl<T: 'static> Detach for RefCell<SubscriberList<T>> {
    fn detach(&self, key: EntryKey) {
        // Drop the entry only after the borrow is released: it owns the
        // comparison function, whose captures may reach back into this list.
        let removed = self.borrow_mut().remove(key);
        if removed.is_some() {
            debug!(?key, "subscriber entry removed");
        }
        drop(removed);
    }
}

/// Capability to remove one entry from a provider's subscriber list.
///
/// Held by the subscribing component and released when it unmounts, or when
/// the last reference to the component is dropped. Dropping a
/// `Subscription` removes the entry; if the provider is already gone there
/// is nothing left to remove.
pub struct Subscription {
    key: EntryKey,
    component: ComponentId,
    list: Weak<dyn Detach>,
}

impl Subscription {
    pub(crate) fn new<T: 'static>(
        key: EntryKey,
        component: ComponentId,
        list: &Rc<RefCell<SubscriberList<T>>>,
    ) -> Self {
        let list: Rc<dyn Detach> = list.clone();
        Self {
            key,
            component,
            list: Rc::downgrade(&list),
        }
    }

    /// Remove the entry now.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.detach(self.key);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("component", &self.component)
            .field("provider_alive", &(self.list.strong_count() > 0))
            .finish()
    }
}
