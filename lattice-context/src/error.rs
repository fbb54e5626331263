//! Error types.

use thiserror::Error;

use crate::component::ComponentId;
use crate::context::ContextId;

/// Errors raised by the context system.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The component already left the tree; a subscription would never be
    /// released.
    #[error("cannot subscribe {0}: component is no longer mounted")]
    Unmounted(ComponentId),

    /// The ambient entry for this context does not hold a provider of the
    /// requested value type.
    #[error("ambient entry for context {id} holds a provider of a different value type")]
    TypeMismatch { id: ContextId },

    /// The runtime configuration could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = ContextError> = std::result::Result<T, E>;
