//! Provider Instances
//!
//! A [`ProviderInstance`] is the runtime side of one mounted provider
//! component. It publishes its value to the subtree and keeps the list of
//! consumers that want to re-render when the value changes.
//!
//! # Lifecycle
//!
//! The instance is installed lazily, on its first render, child-context
//! request or subscription, whichever comes first. Installation is tracked
//! by an explicit flag; exposure, interception and subscription are plain
//! methods. The subscriber list itself is only allocated when the first
//! consumer subscribes, so a provider nobody listens to never iterates
//! anything.
//!
//! There is no explicit teardown. When the provider component goes away
//! the instance is dropped and its subscriber list with it; subscriptions
//! still held by consumers then have nothing left to remove.
//!
//! # Update Interception
//!
//! The renderer calls [`receive_props`](ProviderInstance::receive_props)
//! before it commits new props. If the value changed (by [`Identity`]),
//! every subscriber observes the new value, and those without a comparison
//! function, or whose comparison returns `true`, are handed to the render
//! queue. A comparison returning `false` leaves the subscriber with a fresh
//! value but no scheduled render; it picks the value up the next time it
//! renders for another reason.
//!
//! Whether the provider itself re-renders is not decided here.

use std::any::Any;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::ambient::ChildContext;
use super::consumer::ConsumerHandle;
use super::descriptor::{ContextDescriptor, ProviderKind};
use super::identity::Identity;
use super::subscription::{Entry, ShouldUpdate, SubscriberList, Subscription};
use crate::component::{ComponentId, RenderQueue};
use crate::config::RuntimeConfig;
use crate::error::{ContextError, Result};

pub(crate) struct ProviderInner<T: 'static> {
    context: ContextDescriptor<T>,
    /// The provider's current `value` prop.
    value: RefCell<T>,
    installed: Cell<bool>,
    subscribers: OnceCell<Rc<RefCell<SubscriberList<T>>>>,
    queue: Rc<dyn RenderQueue>,
    config: RuntimeConfig,
}

/// Runtime state of one mounted provider.
///
/// Cloning yields another handle to the same instance.
pub struct ProviderInstance<T: 'static> {
    inner: Rc<ProviderInner<T>>,
}

impl<T: 'static> ProviderKind<T> {
    /// Create the runtime instance for a newly mounted provider, with the
    /// default configuration.
    pub fn instantiate(&self, value: T, queue: Rc<dyn RenderQueue>) -> ProviderInstance<T> {
        self.instantiate_with(value, queue, RuntimeConfig::default())
    }

    /// Create the runtime instance for a newly mounted provider.
    pub fn instantiate_with(
        &self,
        value: T,
        queue: Rc<dyn RenderQueue>,
        config: RuntimeConfig,
    ) -> ProviderInstance<T> {
        ProviderInstance {
            inner: Rc::new(ProviderInner {
                context: self.context.clone(),
                value: RefCell::new(value),
                installed: Cell::new(false),
                subscribers: OnceCell::new(),
                queue,
                config,
            }),
        }
    }
}

impl<T: 'static> ProviderInstance<T> {
    pub(crate) fn from_inner(inner: Rc<ProviderInner<T>>) -> Self {
        Self { inner }
    }

    /// The descriptor this provider publishes for.
    pub fn context(&self) -> &ContextDescriptor<T> {
        &self.inner.context
    }

    /// Check whether the first activation has happened.
    pub fn is_installed(&self) -> bool {
        self.inner.installed.get()
    }

    fn install(&self) {
        if !self.inner.installed.replace(true) {
            debug!(context = %self.inner.context.id(), "provider installed");
        }
    }

    /// Render the provider: its children pass through unchanged.
    pub fn render<C>(&self, children: C) -> C {
        self.install();
        children
    }

    /// Expose this instance to the subtree.
    ///
    /// The returned mapping holds a single entry, this provider under its
    /// context ID. Merging it into the mapping inherited from above is up
    /// to the caller; see [`ChildContext::merged`].
    pub fn child_context(&self) -> ChildContext {
        self.install();
        let instance: Rc<dyn Any> = self.inner.clone();
        ChildContext::single(self.inner.context.id(), instance)
    }

    /// Register a consumer for change notifications.
    ///
    /// The subscription is held by the consumer's component and released
    /// when it unmounts. The provider does not keep `handle` alive: once the
    /// renderer drops its last handle the entry is skipped and pruned.
    /// Subscribing a component that is already subscribed
    /// to this provider keeps the original entry and its comparison
    /// function.
    pub fn subscribe(
        &self,
        handle: &ConsumerHandle<T>,
        should_update: Option<ShouldUpdate<T>>,
    ) -> Result<()> {
        self.install();

        let component = handle.component();
        if !component.is_mounted() {
            return Err(ContextError::Unmounted(component.id()));
        }

        let list = self
            .inner
            .subscribers
            .get_or_init(|| {
                Rc::new(RefCell::new(SubscriberList::with_capacity(
                    self.inner.config.subscriber_capacity,
                )))
            })
            .clone();

        let (inserted, pruned) = {
            let mut list = list.borrow_mut();
            let pruned = list.prune();
            (list.insert(Entry::new(handle, should_update)), pruned)
        };
        drop(pruned);

        match inserted {
            Ok(key) => {
                component.hold(Subscription::new(key, component.id(), &list));
                debug!(
                    context = %self.inner.context.id(),
                    component = %component.id(),
                    ?key,
                    "consumer subscribed"
                );
            }
            Err(rejected) => {
                drop(rejected);
                debug!(
                    context = %self.inner.context.id(),
                    component = %component.id(),
                    "consumer already subscribed"
                );
            }
        }

        Ok(())
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .get()
            .map_or(0, |list| list.borrow().len())
    }

    /// Subscribed components, in subscription order.
    pub fn subscribers(&self) -> Vec<ComponentId> {
        self.inner
            .subscribers
            .get()
            .map(|list| list.borrow().components())
            .unwrap_or_default()
    }

    /// Check whether a component is subscribed to this provider.
    pub fn is_subscribed(&self, component: ComponentId) -> bool {
        self.inner
            .subscribers
            .get()
            .is_some_and(|list| list.borrow().contains_component(component))
    }

    /// Commit a new `value` prop without notifying anyone.
    pub fn set_value(&self, next: T) {
        let previous = self.inner.value.replace(next);
        drop(previous);
    }
}

impl<T: Clone + 'static> ProviderInstance<T> {
    /// The current value.
    pub fn value(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: Clone + Identity + 'static> ProviderInstance<T> {
    /// Intercept incoming props before the provider's own update decision.
    ///
    /// Compares the current value with `next`. When they differ, every
    /// subscriber observes `next` and is scheduled for render unless its
    /// comparison function declines. Returns the number of renders
    /// requested.
    ///
    /// Subscribers removed while the pass is running are not visited again.
    pub fn receive_props(&self, next: &T) -> usize {
        self.install();

        let previous = {
            let current = self.inner.value.borrow();
            if current.is_same(next) {
                return 0;
            }
            current.clone()
        };

        let Some(list) = self.inner.subscribers.get().cloned() else {
            return 0;
        };
        let (snapshot, pruned) = {
            let mut list = list.borrow_mut();
            let pruned = list.prune();
            (list.snapshot(), pruned)
        };
        if !pruned.is_empty() {
            debug!(
                context = %self.inner.context.id(),
                pruned = pruned.len(),
                "dropped consumers pruned"
            );
        }
        drop(pruned);
        if snapshot.is_empty() {
            return 0;
        }

        let context = self.inner.context.id();
        let trace_each = self.inner.config.trace_notifications;
        let mut visited = 0;
        let mut scheduled = 0;

        for (key, handle, should_update) in snapshot {
            if !list.borrow().contains(key) {
                continue;
            }
            visited += 1;
            handle.set_context(next.clone());

            let wants_render = match &should_update {
                Some(should_update) => should_update(next, &previous),
                None => true,
            };

            // The comparison may have unmounted the subscriber.
            if wants_render && list.borrow().contains(key) {
                self.inner.queue.enqueue_render(handle.id());
                scheduled += 1;
            }

            if trace_each {
                trace!(
                    %context,
                    component = %handle.id(),
                    wants_render,
                    "subscriber notified"
                );
            }
        }

        debug!(%context, visited, scheduled, "provider value changed");
        scheduled
    }

    /// Intercept and then commit a new `value` prop.
    ///
    /// Each call compares against the value committed by the previous one,
    /// so a burst of updates before the next flush never misses a change.
    pub fn update(&self, next: T) -> usize {
        let scheduled = self.receive_props(&next);
        self.set_value(next);
        scheduled
    }
}

impl<T: 'static> Clone for ProviderInstance<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ProviderInstance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("context", &self.inner.context.id())
            .field("value", &*self.inner.value.borrow())
            .field("installed", &self.is_installed())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
