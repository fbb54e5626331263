//! Context Propagation
//!
//! This module lets an ancestor component publish a value that its
//! descendants read without threading it through props, and makes sure
//! that only the descendants consuming a changed value are re-rendered.
//!
//! # Concepts
//!
//! ## Descriptors
//!
//! [`create_context`] returns a [`ContextDescriptor`]: a unique ID, a
//! default value, and the two component kinds of the context.
//!
//! ## Providers
//!
//! A mounted provider is a [`ProviderInstance`]. It exposes itself to its
//! subtree through the ambient [`ChildContext`] mapping and keeps a list of
//! subscribed consumers. When its value changes it pushes the new value to
//! every subscriber and asks the render queue to re-render the ones that
//! want it.
//!
//! ## Consumers
//!
//! A consumer renders with the nearest provider's value, or with the
//! default value when there is none. Subscribing hands a
//! [`ConsumerHandle`] to the provider, optionally with a comparison
//! function that can decline forced re-renders.
//!
//! # Implementation Notes
//!
//! Everything here is single-threaded and synchronous. Shared state lives
//! in `Rc`/`RefCell`, and no borrow of a subscriber list is held while user
//! code (comparison functions, render queue, teardown) runs, so that code
//! may unsubscribe components in the middle of a notification pass.

mod ambient;
mod consumer;
mod descriptor;
mod identity;
mod provider;
mod subscription;

pub use ambient::{use_context, AmbientScope, ChildContext};
pub use consumer::ConsumerHandle;
pub use descriptor::{create_context, ConsumerKind, ContextDescriptor, ContextId, ProviderKind};
pub use identity::Identity;
pub use provider::ProviderInstance;
pub use subscription::{EntryKey, ShouldUpdate, Subscription};
