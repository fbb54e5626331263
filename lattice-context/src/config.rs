//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings shared by every provider mounted through a
/// [`ContextRuntime`](crate::ContextRuntime).
///
/// Missing fields fall back to their defaults:
///
/// ```rust
/// use lattice_context::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "trace_notifications": true }"#).unwrap();
/// assert!(config.trace_notifications);
/// assert_eq!(config.subscriber_capacity, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Initial capacity of a provider's subscriber list, allocated on the
    /// first subscription.
    pub subscriber_capacity: usize,

    /// Emit a `trace` event for every subscriber visited by a notification
    /// pass.
    pub trace_notifications: bool,
}

impl RuntimeConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 4,
            trace_notifications: false,
        }
    }
}
