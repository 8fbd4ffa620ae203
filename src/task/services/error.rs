//! Error type for task lifecycle operations.

use crate::status::domain::StatusId;
use crate::status::services::StatusRegistryError;
use crate::task::{
    domain::{PendencyId, TaskDomainError, TaskId},
    ports::TaskRepositoryError,
};
use thiserror::Error;

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Caller input failed validation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
    /// Status registry lookup failed.
    #[error(transparent)]
    Registry(#[from] StatusRegistryError),
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    /// No pendency exists with the given identifier.
    #[error("pendency {0} not found")]
    PendencyNotFound(PendencyId),
    /// No status exists with the given identifier.
    #[error("status {0} not found")]
    StatusNotFound(StatusId),
    /// Stored data breaks an invariant the engine relies on.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The tree kept being restructured while the operation waited for it.
    #[error("tree root kept moving after {attempts} lock attempts")]
    Contention {
        /// Number of lock attempts made.
        attempts: u32,
    },
}

impl TaskLifecycleError {
    /// Returns whether the error reports a missing task, pendency, or status.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::TaskNotFound(_) | Self::PendencyNotFound(_) | Self::StatusNotFound(_) => true,
            Self::Registry(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Returns whether the error reports invalid caller input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}

impl From<TaskRepositoryError> for TaskLifecycleError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::TaskNotFound(id),
            TaskRepositoryError::PendencyNotFound(id) => Self::PendencyNotFound(id),
            TaskRepositoryError::CycleDetected(id) => {
                Self::InvariantViolation(format!("parent chain of task {id} contains a cycle"))
            }
            other => Self::Repository(other),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
