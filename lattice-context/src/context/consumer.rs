//! Consumers
//!
//! A consumer is a pure projection: it renders its `children` function with
//! the value of the nearest provider, or with the context's default value
//! when no provider encloses it.
//!
//! A [`ConsumerHandle`] pairs the consumer's [`Component`] record with the
//! context value the consumer currently observes. Providers overwrite that
//! value on every change, scheduled or not, so the next render always sees
//! the latest value.
//!
//! Providers only keep a weak reference to the handle. The renderer owns
//! it; once the last handle is dropped the provider stops notifying it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::ambient::ChildContext;
use super::descriptor::ConsumerKind;
use super::identity::Identity;
use super::subscription::ShouldUpdate;
use crate::component::{Component, ComponentId};
use crate::error::Result;

struct HandleInner<T> {
    component: Component,
    context: RefCell<T>,
}

/// A subscribed consumer: its component record and observed value.
pub struct ConsumerHandle<T: 'static> {
    inner: Rc<HandleInner<T>>,
}

impl<T: 'static> ConsumerHandle<T> {
    /// Pair a component with the value it observes initially.
    pub fn new(component: Component, context: T) -> Self {
        Self {
            inner: Rc::new(HandleInner {
                component,
                context: RefCell::new(context),
            }),
        }
    }

    /// The component's unique ID.
    pub fn id(&self) -> ComponentId {
        self.inner.component.id()
    }

    /// The component record.
    pub fn component(&self) -> &Component {
        &self.inner.component
    }

    pub(crate) fn set_context(&self, value: T) {
        let previous = self.inner.context.replace(value);
        drop(previous);
    }

    pub(crate) fn downgrade(&self) -> WeakConsumer<T> {
        WeakConsumer {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<T: Clone + 'static> ConsumerHandle<T> {
    /// The observed value.
    pub fn context(&self) -> T {
        self.inner.context.borrow().clone()
    }

    /// Render with the observed value.
    ///
    /// `children` gets its own copy of the value, so it may update the
    /// provider this consumer listens to.
    pub fn render<R>(&self, children: impl FnOnce(&T) -> R) -> R {
        let value = self.context();
        children(&value)
    }
}

/// Non-owning reference to a consumer, as kept by a provider.
pub(crate) struct WeakConsumer<T: 'static> {
    inner: Weak<HandleInner<T>>,
}

impl<T: 'static> WeakConsumer<T> {
    pub(crate) fn upgrade(&self) -> Option<ConsumerHandle<T>> {
        self.inner.upgrade().map(|inner| ConsumerHandle { inner })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T: 'static> Clone for ConsumerHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ConsumerHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerHandle")
            .field("component", &self.inner.component)
            .field("context", &*self.inner.context.borrow())
            .finish()
    }
}

impl<T: 'static> ConsumerKind<T> {
    /// Render `children` with the value resolved for this consumer.
    pub fn render<R>(&self, children: impl FnOnce(&T) -> R, ambient: &T) -> R {
        children(ambient)
    }
}

impl<T: Clone + Identity + 'static> ConsumerKind<T> {
    /// Mount a consumer below the given ambient mapping.
    ///
    /// Seeds the handle with the nearest provider's value, or the default
    /// value when there is none, and subscribes it to that provider.
    pub fn mount(
        &self,
        component: Component,
        scope: &ChildContext,
        should_update: Option<ShouldUpdate<T>>,
    ) -> Result<ConsumerHandle<T>> {
        match scope.provider(&self.context)? {
            Some(provider) => {
                let handle = ConsumerHandle::new(component, provider.value());
                provider.subscribe(&handle, should_update)?;
                Ok(handle)
            }
            None => Ok(ConsumerHandle::new(
                component,
                self.context.default_value().clone(),
            )),
        }
    }
}
