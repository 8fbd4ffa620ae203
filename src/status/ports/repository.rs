//! Repository port for status persistence and atomic role assignment.

use crate::status::domain::{Status, StatusId, StatusRole};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for status repository operations.
pub type StatusRepositoryResult<T> = Result<T, StatusRepositoryError>;

/// Status persistence contract.
///
/// Roles are never written by [`Self::store`] or [`Self::update`]; they
/// change only through [`Self::assign_role`] and [`Self::clear_role`], which
/// must each be atomic with respect to concurrent callers.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Stores a new status without any roles.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRepositoryError::DuplicateStatus`] when the status ID
    /// already exists, or [`StatusRepositoryError::NotFound`] when a
    /// transition edge targets an unknown status.
    async fn store(&self, status: &Status) -> StatusRepositoryResult<()>;

    /// Persists name, colour, and transition edges of an existing status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRepositoryError::NotFound`] when the status, or a
    /// transition target, does not exist.
    async fn update(&self, status: &Status) -> StatusRepositoryResult<()>;

    /// Finds a status by identifier.
    ///
    /// Returns `None` when the status does not exist.
    async fn find_by_id(&self, id: StatusId) -> StatusRepositoryResult<Option<Status>>;

    /// Returns every status, ordered by name.
    async fn list_all(&self) -> StatusRepositoryResult<Vec<Status>>;

    /// Returns every status currently holding `role`.
    ///
    /// More than one result indicates a bypassed write path.
    async fn find_by_role(&self, role: StatusRole) -> StatusRepositoryResult<Vec<Status>>;

    /// Grants `role` to `id` and revokes it from every other status in one
    /// atomic step.
    ///
    /// Returns the identifiers that lost the role.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRepositoryError::NotFound`] when the status does not
    /// exist; no role is changed in that case.
    async fn assign_role(
        &self,
        id: StatusId,
        role: StatusRole,
    ) -> StatusRepositoryResult<Vec<StatusId>>;

    /// Revokes `role` from every status.
    ///
    /// Returns the identifiers that lost the role.
    async fn clear_role(&self, role: StatusRole) -> StatusRepositoryResult<Vec<StatusId>>;
}

/// Errors returned by status repository implementations.
#[derive(Debug, Clone, Error)]
pub enum StatusRepositoryError {
    /// A status with the same identifier already exists.
    #[error("duplicate status identifier: {0}")]
    DuplicateStatus(StatusId),

    /// The status was not found.
    #[error("status not found: {0}")]
    NotFound(StatusId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StatusRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
