//! Service layer for the status registry.
//!
//! Provides [`StatusRegistryService`], the only write path for status roles.
//! Role assignment is serialised by a registry-wide mutex on top of the
//! repository's atomic `assign_role`, and every write invalidates the
//! cached [`StatusCatalog`] that the lifecycle engine reads from.

use super::StatusCatalog;
use crate::health::{EngineHealth, HealthReport};
use crate::status::{
    domain::{Status, StatusColor, StatusDomainError, StatusId, StatusName, StatusRole},
    ports::{StatusRepository, StatusRepositoryError},
};
use mockable::Clock;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

/// Request payload for creating a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStatusRequest {
    name: String,
    color: Option<String>,
}

impl CreateStatusRequest {
    /// Creates a request with the required display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    /// Sets the presentation colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Request payload for renaming or recolouring a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatusRequest {
    id: StatusId,
    name: Option<String>,
    color: Option<String>,
}

impl UpdateStatusRequest {
    /// Creates a request that changes nothing yet.
    #[must_use]
    pub const fn new(id: StatusId) -> Self {
        Self {
            id,
            name: None,
            color: None,
        }
    }

    /// Sets a new display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a new presentation colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Service-level errors for status registry operations.
#[derive(Debug, Error)]
pub enum StatusRegistryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] StatusDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] StatusRepositoryError),
    /// No status exists with the given identifier.
    #[error("status {0} not found")]
    NotFound(StatusId),
}

impl StatusRegistryError {
    /// Returns whether the error reports a missing status.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Repository(StatusRepositoryError::NotFound(_))
        )
    }

    fn from_repository(err: StatusRepositoryError) -> Self {
        match err {
            StatusRepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for status registry operations.
pub type StatusRegistryResult<T> = Result<T, StatusRegistryError>;

#[derive(Debug, Default)]
struct CatalogCache {
    generation: u64,
    catalog: Option<Arc<StatusCatalog>>,
}

/// Status catalog, transition graph, and role assignment service.
///
/// Clones share the repository, the write lock, and the catalog cache.
pub struct StatusRegistryService<R, C>
where
    R: StatusRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    health: Arc<EngineHealth>,
    write_lock: Arc<Mutex<()>>,
    cache: Arc<RwLock<CatalogCache>>,
}

impl<R, C> Clone for StatusRegistryService<R, C>
where
    R: StatusRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            health: Arc::clone(&self.health),
            write_lock: Arc::clone(&self.write_lock),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<R, C> StatusRegistryService<R, C>
where
    R: StatusRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new status registry service with its own health counters.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            health: Arc::new(EngineHealth::new()),
            write_lock: Arc::new(Mutex::new(())),
            cache: Arc::new(RwLock::new(CatalogCache::default())),
        }
    }

    /// Replaces the health counters, so several services can share one set.
    #[must_use]
    pub fn with_health(mut self, health: Arc<EngineHealth>) -> Self {
        self.health = health;
        self
    }

    /// Returns the shared health counters.
    #[must_use]
    pub fn health(&self) -> Arc<EngineHealth> {
        Arc::clone(&self.health)
    }

    /// Creates a status with no roles and no outgoing transitions.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::Domain`] when the name or colour is
    /// invalid, or [`StatusRegistryError::Repository`] when persistence
    /// fails.
    pub async fn create_status(&self, request: CreateStatusRequest) -> StatusRegistryResult<Status> {
        let CreateStatusRequest {
            name: raw_name,
            color: raw_color,
        } = request;
        let name = StatusName::new(raw_name)?;
        let color = raw_color
            .map(StatusColor::new)
            .transpose()?
            .unwrap_or_default();

        let status = Status::new(name, color, &*self.clock);
        self.repository
            .store(&status)
            .await
            .map_err(StatusRegistryError::from_repository)?;
        self.invalidate();
        debug!(status_id = %status.id(), name = %status.name(), "created status");
        Ok(status)
    }

    /// Renames and/or recolours a status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::NotFound`] when the status does not
    /// exist, or [`StatusRegistryError::Domain`] for invalid values.
    pub async fn update_status(&self, request: UpdateStatusRequest) -> StatusRegistryResult<Status> {
        let UpdateStatusRequest {
            id,
            name: raw_name,
            color: raw_color,
        } = request;
        let name = raw_name.map(StatusName::new).transpose()?;
        let color = raw_color.map(StatusColor::new).transpose()?;

        let _guard = self.write_lock.lock().await;
        let mut status = self.require_status(id).await?;
        if let Some(new_name) = name {
            status.rename(new_name, &*self.clock);
        }
        if let Some(new_color) = color {
            status.recolor(new_color, &*self.clock);
        }
        self.persist(&status).await?;
        Ok(status)
    }

    /// Adds the directed edge `from -> to` to the transition graph.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::NotFound`] when either status does not
    /// exist.
    pub async fn allow_transition(&self, from: StatusId, to: StatusId) -> StatusRegistryResult<Status> {
        let _guard = self.write_lock.lock().await;
        self.require_status(to).await?;
        let mut status = self.require_status(from).await?;
        if status.allow_transition_to(to, &*self.clock) {
            self.persist(&status).await?;
        }
        Ok(status)
    }

    /// Removes the directed edge `from -> to` from the transition graph.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::NotFound`] when `from` does not exist.
    pub async fn disallow_transition(
        &self,
        from: StatusId,
        to: StatusId,
    ) -> StatusRegistryResult<Status> {
        let _guard = self.write_lock.lock().await;
        let mut status = self.require_status(from).await?;
        if status.disallow_transition_to(to, &*self.clock) {
            self.persist(&status).await?;
        }
        Ok(status)
    }

    /// Returns the statuses directly reachable from `id`.
    ///
    /// An empty result is legal and only means no transition is configured.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::NotFound`] when the status does not
    /// exist.
    pub async fn allowed_next(&self, id: StatusId) -> StatusRegistryResult<Vec<Status>> {
        let catalog = self.catalog().await?;
        let status = catalog.find(id).ok_or(StatusRegistryError::NotFound(id))?;
        Ok(status
            .next_statuses()
            .iter()
            .filter_map(|next| catalog.find(*next).cloned())
            .collect())
    }

    /// Returns whether the graph has a direct edge `from -> to`.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::NotFound`] when `from` does not exist.
    pub async fn can_transition(&self, from: StatusId, to: StatusId) -> StatusRegistryResult<bool> {
        let catalog = self.catalog().await?;
        let status = catalog.find(from).ok_or(StatusRegistryError::NotFound(from))?;
        Ok(status.allows_transition_to(to))
    }

    /// Grants `role` to `id` and revokes it from every other status.
    ///
    /// The assignment is re-checked after it commits; a second holder found
    /// at that point is reported as an invariant violation and revoked.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::NotFound`] when the status does not
    /// exist; no role changes in that case.
    #[instrument(skip_all, fields(status_id = %id, role = %role))]
    pub async fn assign_role(&self, id: StatusId, role: StatusRole) -> StatusRegistryResult<Status> {
        let _guard = self.write_lock.lock().await;
        let revoked = self
            .repository
            .assign_role(id, role)
            .await
            .map_err(StatusRegistryError::from_repository)?;
        self.invalidate();
        info!(revoked = ?revoked, "assigned status role");

        let holders = self.repository.find_by_role(role).await?;
        if holders.iter().any(|holder| holder.id() != id) {
            self.report_violation(role, holders.iter().map(Status::id).collect());
            self.repository.assign_role(id, role).await?;
            self.invalidate();
        }
        self.require_status(id).await
    }

    /// Marks `id` as the default status for new tasks.
    ///
    /// # Errors
    ///
    /// See [`Self::assign_role`].
    pub async fn set_default(&self, id: StatusId) -> StatusRegistryResult<Status> {
        self.assign_role(id, StatusRole::Default).await
    }

    /// Marks `id` as the status entered when a pendency is reopened.
    ///
    /// # Errors
    ///
    /// See [`Self::assign_role`].
    pub async fn set_pending(&self, id: StatusId) -> StatusRegistryResult<Status> {
        self.assign_role(id, StatusRole::Pending).await
    }

    /// Marks `id` as the status entered when a pendency is resolved.
    ///
    /// # Errors
    ///
    /// See [`Self::assign_role`].
    pub async fn set_executing(&self, id: StatusId) -> StatusRegistryResult<Status> {
        self.assign_role(id, StatusRole::Executing).await
    }

    /// Marks `id` as the terminal status.
    ///
    /// # Errors
    ///
    /// See [`Self::assign_role`].
    pub async fn set_final(&self, id: StatusId) -> StatusRegistryResult<Status> {
        self.assign_role(id, StatusRole::Final).await
    }

    /// Leaves `role` unheld.
    ///
    /// Returns the identifiers that lost the role.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::Repository`] when persistence fails.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn clear_role(&self, role: StatusRole) -> StatusRegistryResult<Vec<StatusId>> {
        let _guard = self.write_lock.lock().await;
        let revoked = self.repository.clear_role(role).await?;
        self.invalidate();
        info!(revoked = ?revoked, "cleared status role");
        Ok(revoked)
    }

    /// Returns the status holding `role`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::Repository`] when persistence lookup
    /// fails.
    pub async fn role_holder(&self, role: StatusRole) -> StatusRegistryResult<Option<Status>> {
        Ok(self.catalog().await?.role_holder(role).cloned())
    }

    /// Returns the default status, if one is configured.
    ///
    /// # Errors
    ///
    /// See [`Self::role_holder`].
    pub async fn get_default(&self) -> StatusRegistryResult<Option<Status>> {
        self.role_holder(StatusRole::Default).await
    }

    /// Returns the pending status, if one is configured.
    ///
    /// # Errors
    ///
    /// See [`Self::role_holder`].
    pub async fn get_pending(&self) -> StatusRegistryResult<Option<Status>> {
        self.role_holder(StatusRole::Pending).await
    }

    /// Returns the executing status, if one is configured.
    ///
    /// # Errors
    ///
    /// See [`Self::role_holder`].
    pub async fn get_executing(&self) -> StatusRegistryResult<Option<Status>> {
        self.role_holder(StatusRole::Executing).await
    }

    /// Returns the terminal status, if one is configured.
    ///
    /// # Errors
    ///
    /// See [`Self::role_holder`].
    pub async fn get_final(&self) -> StatusRegistryResult<Option<Status>> {
        self.role_holder(StatusRole::Final).await
    }

    /// Returns every status, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::Repository`] when persistence lookup
    /// fails.
    pub async fn list_statuses(&self) -> StatusRegistryResult<Vec<Status>> {
        Ok(self.catalog().await?.statuses().to_vec())
    }

    /// Finds a status by identifier.
    ///
    /// Returns `Ok(None)` when the status does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::Repository`] when persistence lookup
    /// fails.
    pub async fn find_status(&self, id: StatusId) -> StatusRegistryResult<Option<Status>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Returns a verified snapshot of every status.
    ///
    /// Snapshots are cached until the next registry write.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::Repository`] when persistence lookup
    /// or invariant repair fails.
    pub async fn catalog(&self) -> StatusRegistryResult<Arc<StatusCatalog>> {
        let generation = {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(catalog) = &cache.catalog {
                return Ok(Arc::clone(catalog));
            }
            cache.generation
        };

        let loaded = Arc::new(self.load_catalog().await?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.generation == generation {
            cache.catalog = Some(Arc::clone(&loaded));
        }
        Ok(loaded)
    }

    /// Builds a health report from the shared counters and the current
    /// role assignment.
    ///
    /// # Errors
    ///
    /// Returns [`StatusRegistryError::Repository`] when persistence lookup
    /// fails.
    pub async fn health_report(&self) -> StatusRegistryResult<HealthReport> {
        let catalog = self.catalog().await?;
        Ok(self.health.report(catalog.unheld_roles()))
    }

    async fn require_status(&self, id: StatusId) -> StatusRegistryResult<Status> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(StatusRegistryError::NotFound(id))
    }

    async fn persist(&self, status: &Status) -> StatusRegistryResult<()> {
        self.repository
            .update(status)
            .await
            .map_err(StatusRegistryError::from_repository)?;
        self.invalidate();
        Ok(())
    }

    async fn load_catalog(&self) -> StatusRegistryResult<StatusCatalog> {
        let catalog = StatusCatalog::new(self.repository.list_all().await?);
        let violations = catalog.violations();
        if violations.is_empty() {
            return Ok(catalog);
        }

        let _guard = self.write_lock.lock().await;
        for (role, holders) in violations {
            self.report_violation(role, holders.clone());
            if let Some(keep) = holders.first() {
                self.repository.assign_role(*keep, role).await?;
            }
        }
        self.invalidate();
        Ok(StatusCatalog::new(self.repository.list_all().await?))
    }

    fn report_violation(&self, role: StatusRole, holders: Vec<StatusId>) {
        self.health.record_invariant_violation();
        error!(
            role = %role,
            holders = ?holders,
            "status role held by more than one status; a write bypassed the registry"
        );
    }

    fn invalidate(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.generation = cache.generation.wrapping_add(1);
        cache.catalog = None;
    }
}
