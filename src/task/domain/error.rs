//! Error types for task domain validation and parsing.

use super::TaskId;
use crate::status::domain::StatusId;
use thiserror::Error;

/// Validation errors raised by task and pendency operations.
///
/// Every variant describes a caller mistake; none is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the persisted length limit.
    #[error("task title is too long")]
    TitleTooLong,

    /// The pendency description is empty after trimming.
    #[error("pendency description must not be empty")]
    EmptyPendencyDescription,

    /// A task was named as its own parent.
    #[error("task {0} cannot be its own parent")]
    SelfParent(TaskId),

    /// The requested parent is a descendant of the task, which would close
    /// a cycle in the tree.
    #[error("task {parent_id} is a descendant of task {task_id} and cannot become its parent")]
    AncestorCycle {
        /// Task being reparented.
        task_id: TaskId,
        /// Rejected parent.
        parent_id: TaskId,
    },

    /// Moving a task into the pending status requires describing the issue.
    #[error("a pendency description is required to move task {0} to the pending status")]
    PendencyDescriptionRequired(TaskId),

    /// The transition graph has no edge between the two statuses.
    #[error("transition from status {from} to status {to} is not allowed")]
    TransitionNotAllowed {
        /// Current status.
        from: StatusId,
        /// Rejected target status.
        to: StatusId,
    },
}

/// Error returned while parsing task levels from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task level: {0}")]
pub struct ParseTaskLevelError(pub String);
