//! Error types for status domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing status domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusDomainError {
    /// The status name is empty after trimming.
    #[error("status name must not be empty")]
    EmptyName,

    /// The status name exceeds the persisted length limit.
    #[error("status name '{0}' is too long")]
    NameTooLong(String),

    /// The colour is not a `#rrggbb` hex string.
    #[error("invalid status colour '{0}', expected #rrggbb")]
    InvalidColor(String),
}

/// Error returned while parsing status roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status role: {0}")]
pub struct ParseStatusRoleError(pub String);
