//! Context Runtime
//!
//! The runtime is what a renderer holds on to: the configuration every
//! provider is created with and the render queue providers hand their
//! subscribers to. Mounting through the runtime wires both in.
//!
//! # How It Works
//!
//! 1. The renderer mounts a provider with [`ContextRuntime::mount_provider`]
//!    and, after each provider render, merges
//!    [`child_context`](ProviderInstance::child_context) into the mapping
//!    passed to the provider's descendants.
//!
//! 2. Consumers are mounted with [`ContextRuntime::mount_consumer`] against
//!    that mapping. They observe the nearest provider's value and subscribe
//!    to it.
//!
//! 3. When a provider receives new props the renderer calls
//!    [`update`](ProviderInstance::update). Affected consumers land in the
//!    render queue.
//!
//! 4. Unmounting a consumer's [`Component`] removes its subscriptions.

use std::rc::Rc;

use tracing::debug;

use crate::component::{Component, RenderQueue};
use crate::config::RuntimeConfig;
use crate::context::{
    ChildContext, ConsumerHandle, ConsumerKind, Identity, ProviderInstance, ProviderKind,
    ShouldUpdate,
};
use crate::error::Result;

/// Shared configuration and render queue for mounted providers.
#[derive(Clone)]
pub struct ContextRuntime {
    config: RuntimeConfig,
    queue: Rc<dyn RenderQueue>,
}

impl ContextRuntime {
    /// Create a runtime with the default configuration.
    pub fn new(queue: Rc<dyn RenderQueue>) -> Self {
        Self::with_config(RuntimeConfig::default(), queue)
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: RuntimeConfig, queue: Rc<dyn RenderQueue>) -> Self {
        debug!(?config, "context runtime created");
        Self { config, queue }
    }

    /// Create a runtime from a JSON configuration.
    pub fn from_json(json: &str, queue: Rc<dyn RenderQueue>) -> Result<Self> {
        Ok(Self::with_config(RuntimeConfig::from_json(json)?, queue))
    }

    /// The configuration providers are created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Mount a provider with its initial `value` prop.
    pub fn mount_provider<T: 'static>(
        &self,
        kind: &ProviderKind<T>,
        value: T,
    ) -> ProviderInstance<T> {
        kind.instantiate_with(value, Rc::clone(&self.queue), self.config.clone())
    }

    /// Mount a consumer below `scope` as a new component.
    pub fn mount_consumer<T: Clone + Identity + 'static>(
        &self,
        kind: &ConsumerKind<T>,
        scope: &ChildContext,
        should_update: Option<ShouldUpdate<T>>,
    ) -> Result<ConsumerHandle<T>> {
        let handle = kind.mount(Component::new(), scope, should_update)?;
        debug!(
            context = %kind.context_type().id(),
            component = %handle.id(),
            "consumer mounted"
        );
        Ok(handle)
    }
}

impl std::fmt::Debug for ContextRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRuntime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
