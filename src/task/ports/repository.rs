//! Repository ports for tasks, the tree structure, and pendencies.

use crate::task::domain::{Pendency, PendencyId, Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task and pendency repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence and tree-navigation contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Removes a task together with its pendencies.
    ///
    /// Children are not touched; callers detach them first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the direct children of `parent_id`, oldest first.
    async fn find_children(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the ancestors of `id`, nearest first, excluding `id` itself.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::CycleDetected`] when the parent chain loops.
    async fn ancestor_ids(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>>;
}

/// Pendency persistence contract.
#[async_trait]
pub trait PendencyRepository: Send + Sync {
    /// Stores a new pendency.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicatePendency`] when the ID already
    /// exists or [`TaskRepositoryError::NotFound`] when the owning task does
    /// not exist.
    async fn store_pendency(&self, pendency: &Pendency) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing pendency.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::PendencyNotFound`] when the pendency
    /// does not exist.
    async fn update_pendency(&self, pendency: &Pendency) -> TaskRepositoryResult<()>;

    /// Finds a pendency by identifier.
    ///
    /// Returns `None` when the pendency does not exist.
    async fn find_pendency_by_id(&self, id: PendencyId) -> TaskRepositoryResult<Option<Pendency>>;

    /// Returns every pendency raised against `task_id`, oldest first.
    async fn find_pendencies_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<Pendency>>;
}

/// Errors returned by task and pendency repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A pendency with the same identifier already exists.
    #[error("duplicate pendency identifier: {0}")]
    DuplicatePendency(PendencyId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The pendency was not found.
    #[error("pendency not found: {0}")]
    PendencyNotFound(PendencyId),

    /// Walking the parent chain from the task revisited a task.
    #[error("parent chain of task {0} contains a cycle")]
    CycleDetected(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
