//! Engine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Days added to the start date when a task has no due date.
    pub due_date_offset_days: u32,
    /// Upper bound on ancestor levels visited by one cascade walk.
    pub max_cascade_depth: usize,
    /// Whether status changes must follow the configured transition graph.
    pub enforce_transitions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            due_date_offset_days: 7,
            max_cascade_depth: 64,
            enforce_transitions: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration that enforces the transition graph.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            enforce_transitions: true,
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineConfigError::Parse`] for malformed input or unknown
    /// fields, and [`EngineConfigError::ZeroCascadeDepth`] when the cascade
    /// bound is zero.
    pub fn from_json(input: &str) -> Result<Self, EngineConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()
    }

    /// Sets the due-date offset.
    #[must_use]
    pub const fn with_due_date_offset_days(mut self, days: u32) -> Self {
        self.due_date_offset_days = days;
        self
    }

    /// Sets the cascade depth bound.
    #[must_use]
    pub const fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    /// Enables or disables transition-graph enforcement.
    #[must_use]
    pub const fn with_enforce_transitions(mut self, enforce: bool) -> Self {
        self.enforce_transitions = enforce;
        self
    }

    fn validate(self) -> Result<Self, EngineConfigError> {
        if self.max_cascade_depth == 0 {
            return Err(EngineConfigError::ZeroCascadeDepth);
        }
        Ok(self)
    }
}

/// Errors returned while loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum EngineConfigError {
    /// The input could not be deserialized.
    #[error("invalid engine configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A cascade bound of zero would stop every cascade before it starts.
    #[error("max_cascade_depth must be at least 1")]
    ZeroCascadeDepth,
}
