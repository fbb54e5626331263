//! Lattice Context
//!
//! This crate provides context propagation for the Lattice component
//! runtime. It implements:
//!
//! - Context descriptors with process-unique IDs and default values
//! - Provider instances that publish a value to their subtree
//! - Subscriber registries with selective re-render on value change
//! - Component records whose teardown releases their subscriptions
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `context`: Descriptors, providers, consumers and the ambient mapping
//! - `component`: Component identity, lifecycle and the render queue boundary
//! - `runtime`: Shared configuration and queue for mounting
//!
//! Tree reconciliation and flushing the render queue belong to the
//! renderer. This crate only decides who needs to render again.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use lattice_context::{create_context, ContextRuntime, DirtyQueue};
//!
//! let queue = Rc::new(DirtyQueue::new());
//! let runtime = ContextRuntime::new(queue.clone());
//!
//! // Create a context
//! let theme = create_context("light");
//!
//! // Mount a provider and a consumer below it
//! let provider = runtime.mount_provider(&theme.provider(), "dark");
//! let scope = provider.child_context();
//! let button = runtime.mount_consumer(&theme.consumer(), &scope, None).unwrap();
//! assert_eq!(button.context(), "dark");
//!
//! // Update the provider: the consumer observes the value and is queued
//! provider.update("solarized");
//! assert_eq!(button.context(), "solarized");
//! assert_eq!(queue.drain(), vec![button.id()]);
//! ```

pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod runtime;

pub use component::{Component, ComponentId, DirtyQueue, RenderQueue};
pub use config::RuntimeConfig;
pub use context::{
    create_context, use_context, AmbientScope, ChildContext, ConsumerHandle, ConsumerKind,
    ContextDescriptor, ContextId, Identity, ProviderInstance, ProviderKind, ShouldUpdate,
    Subscription,
};
pub use error::{ContextError, Result};
pub use runtime::ContextRuntime;
