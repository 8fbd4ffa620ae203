//! In-memory repository for status registry tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::status::{
    domain::{Status, StatusId, StatusRole},
    ports::{StatusRepository, StatusRepositoryError, StatusRepositoryResult},
};

/// Thread-safe in-memory status repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusRepository {
    state: Arc<RwLock<HashMap<StatusId, Status>>>,
}

impl InMemoryStatusRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `role` to `id` without revoking it elsewhere.
    ///
    /// Exists only so tests can simulate a write path that bypassed the
    /// registry and broke the single-holder invariant.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRepositoryError::NotFound`] when the status does not
    /// exist.
    #[cfg(test)]
    pub(crate) fn force_grant_role(
        &self,
        id: StatusId,
        role: StatusRole,
    ) -> StatusRepositoryResult<()> {
        let mut statuses = self.write()?;
        let status = statuses
            .get_mut(&id)
            .ok_or(StatusRepositoryError::NotFound(id))?;
        status.grant_role(role);
        Ok(())
    }

    fn read(&self) -> StatusRepositoryResult<RwLockReadGuard<'_, HashMap<StatusId, Status>>> {
        self.state.read().map_err(|err| {
            StatusRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> StatusRepositoryResult<RwLockWriteGuard<'_, HashMap<StatusId, Status>>> {
        self.state.write().map_err(|err| {
            StatusRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Fails with `NotFound` for the first transition target that is not stored.
fn ensure_targets_exist(
    statuses: &HashMap<StatusId, Status>,
    status: &Status,
) -> StatusRepositoryResult<()> {
    match status
        .next_statuses()
        .iter()
        .find(|target| **target != status.id() && !statuses.contains_key(target))
    {
        Some(missing) => Err(StatusRepositoryError::NotFound(*missing)),
        None => Ok(()),
    }
}

fn sorted_by_name(mut statuses: Vec<Status>) -> Vec<Status> {
    statuses.sort_by(|left, right| {
        left.name()
            .as_str()
            .cmp(right.name().as_str())
            .then_with(|| left.id().cmp(&right.id()))
    });
    statuses
}

#[async_trait]
impl StatusRepository for InMemoryStatusRepository {
    async fn store(&self, status: &Status) -> StatusRepositoryResult<()> {
        let mut statuses = self.write()?;
        if statuses.contains_key(&status.id()) {
            return Err(StatusRepositoryError::DuplicateStatus(status.id()));
        }
        ensure_targets_exist(&statuses, status)?;

        let mut stored = status.clone();
        for role in StatusRole::ALL {
            stored.revoke_role(role);
        }
        statuses.insert(stored.id(), stored);
        Ok(())
    }

    async fn update(&self, status: &Status) -> StatusRepositoryResult<()> {
        let mut statuses = self.write()?;
        ensure_targets_exist(&statuses, status)?;

        let existing = statuses
            .get(&status.id())
            .ok_or(StatusRepositoryError::NotFound(status.id()))?;

        // Roles belong to the stored record, not to the caller's copy.
        let mut stored = status.clone();
        for role in StatusRole::ALL {
            if existing.has_role(role) {
                stored.grant_role(role);
            } else {
                stored.revoke_role(role);
            }
        }
        statuses.insert(stored.id(), stored);
        Ok(())
    }

    async fn find_by_id(&self, id: StatusId) -> StatusRepositoryResult<Option<Status>> {
        let statuses = self.read()?;
        Ok(statuses.get(&id).cloned())
    }

    async fn list_all(&self) -> StatusRepositoryResult<Vec<Status>> {
        let statuses = self.read()?;
        Ok(sorted_by_name(statuses.values().cloned().collect()))
    }

    async fn find_by_role(&self, role: StatusRole) -> StatusRepositoryResult<Vec<Status>> {
        let statuses = self.read()?;
        Ok(sorted_by_name(
            statuses
                .values()
                .filter(|status| status.has_role(role))
                .cloned()
                .collect(),
        ))
    }

    async fn assign_role(
        &self,
        id: StatusId,
        role: StatusRole,
    ) -> StatusRepositoryResult<Vec<StatusId>> {
        let mut statuses = self.write()?;
        if !statuses.contains_key(&id) {
            return Err(StatusRepositoryError::NotFound(id));
        }

        let mut revoked = Vec::new();
        for status in statuses.values_mut() {
            if status.id() == id {
                status.grant_role(role);
            } else if status.revoke_role(role) {
                revoked.push(status.id());
            }
        }
        revoked.sort();
        Ok(revoked)
    }

    async fn clear_role(&self, role: StatusRole) -> StatusRepositoryResult<Vec<StatusId>> {
        let mut statuses = self.write()?;
        let mut revoked: Vec<StatusId> = statuses
            .values_mut()
            .filter_map(|status| status.revoke_role(role).then_some(status.id()))
            .collect();
        revoked.sort();
        Ok(revoked)
    }
}
