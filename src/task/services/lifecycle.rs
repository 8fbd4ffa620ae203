//! Service layer for task creation, editing, and the save pipeline.
//!
//! Every task write goes through the same pipeline while the affected trees
//! are locked: resolve defaults, settle the closure date, persist, and, when
//! the task ends up terminal, cascade finalisation to its ancestors.

use super::cascade::Cascade;
use super::locks::{SubtreeGuard, SubtreeLocks};
use super::requests::{ChangeStatusRequest, CreateTaskRequest, UpdateTaskRequest};
use super::resolver;
use super::{TaskLifecycleError, TaskLifecycleResult};
use crate::config::EngineConfig;
use crate::health::{EngineHealth, HealthReport};
use crate::status::{
    domain::{Status, StatusId, StatusRole},
    ports::StatusRepository,
    services::{StatusCatalog, StatusRegistryService},
};
use crate::task::{
    domain::{
        DeadlineStatus, NewTaskData, Patch, Pendency, PendencyDescription, Task,
        TaskDomainError, TaskId, TaskTitle, UserId,
    },
    ports::{PendencyRepository, TaskRepository, TaskRepositoryError},
};
use chrono::NaiveDate;
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const MAX_LOCK_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SaveMode {
    Insert,
    Update,
}

/// Task lifecycle orchestration service.
///
/// Clones share the repositories, the registry, and the tree locks.
pub struct TaskLifecycleService<R, S, C>
where
    R: TaskRepository + PendencyRepository,
    S: StatusRepository,
    C: Clock + Send + Sync,
{
    pub(super) repository: Arc<R>,
    pub(super) registry: StatusRegistryService<S, C>,
    pub(super) clock: Arc<C>,
    pub(super) config: EngineConfig,
    pub(super) locks: Arc<SubtreeLocks>,
    pub(super) health: Arc<EngineHealth>,
}

impl<R, S, C> Clone for TaskLifecycleService<R, S, C>
where
    R: TaskRepository + PendencyRepository,
    S: StatusRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            registry: self.registry.clone(),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            locks: Arc::clone(&self.locks),
            health: Arc::clone(&self.health),
        }
    }
}

impl<R, S, C> TaskLifecycleService<R, S, C>
where
    R: TaskRepository + PendencyRepository,
    S: StatusRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service sharing the registry's health
    /// counters.
    #[must_use]
    pub fn new(repository: Arc<R>, registry: StatusRegistryService<S, C>, clock: Arc<C>) -> Self {
        let health = registry.health();
        Self {
            repository,
            registry,
            clock,
            config: EngineConfig::default(),
            locks: Arc::new(SubtreeLocks::new()),
            health,
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the status registry this service reads roles from.
    #[must_use]
    pub const fn registry(&self) -> &StatusRegistryService<S, C> {
        &self.registry
    }

    /// Creates a task stamped with `actor` as its creator.
    ///
    /// Missing status and due date are derived before the task is stored;
    /// a task created directly in the terminal status triggers the cascade.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for an invalid title,
    /// [`TaskLifecycleError::TaskNotFound`] for an unknown parent, or
    /// [`TaskLifecycleError::StatusNotFound`] for an unknown status.
    #[instrument(skip_all, fields(actor = %actor))]
    pub async fn create_task(&self, actor: UserId, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let CreateTaskRequest {
            title,
            level,
            description,
            observation,
            parent_id,
            status_id,
            responsible,
            start_date,
            due_date,
        } = request;

        let data = NewTaskData {
            title: TaskTitle::new(title)?,
            level,
            description,
            observation,
            parent_id,
            status_id,
            responsible,
            start_date,
            due_date,
        };
        let catalog = self.registry.catalog().await?;
        if let Some(id) = status_id {
            Self::require_known_status(&catalog, id)?;
        }

        let anchors: Vec<TaskId> = parent_id.into_iter().collect();
        let _guard = self.lock_trees(&anchors).await?;
        let task = self
            .save(
                Task::new(data, Some(actor), &*self.clock),
                SaveMode::Insert,
                &catalog,
            )
            .await?;
        info!(task_id = %task.id(), parent_id = ?task.parent_id(), "created task");
        Ok(task)
    }

    /// Applies a partial edit to a task.
    ///
    /// Moving the task into the pending status from another status requires
    /// a pendency description, which opens a pendency stamped with `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the new parent is the task
    /// itself or one of its descendants, when a required pendency
    /// description is missing, or when a value is invalid. Validation
    /// failures leave the stored task unchanged.
    #[instrument(skip_all, fields(actor = %actor, task_id = %request.task_id))]
    pub async fn update_task(&self, actor: UserId, request: UpdateTaskRequest) -> TaskLifecycleResult<Task> {
        let UpdateTaskRequest {
            task_id,
            title: raw_title,
            level,
            description,
            observation,
            parent_id,
            status_id,
            responsible,
            start_date,
            due_date,
            pendency_description: raw_pendency,
        } = request;

        let title = raw_title.map(TaskTitle::new).transpose()?;
        let pendency_description = normalize_description(raw_pendency);
        let catalog = self.registry.catalog().await?;

        let mut anchors = vec![task_id];
        if let Patch::Set(new_parent) = parent_id {
            anchors.push(new_parent);
        }
        let _guard = self.lock_trees(&anchors).await?;
        let mut task = self.require_task(task_id).await?;

        if let Patch::Set(new_parent) = parent_id {
            self.ensure_not_descendant(task_id, new_parent).await?;
        }
        if let Patch::Set(target) = status_id {
            self.check_status_change(&catalog, &task, target, pendency_description.as_ref())?;
        }

        if let Some(new_title) = title {
            task.set_title(new_title);
        }
        if let Some(new_level) = level {
            task.set_level(new_level);
        }
        if let Some(new_description) = description {
            task.set_description(new_description);
        }
        if let Some(new_observation) = observation {
            task.set_observation(new_observation);
        }
        if !parent_id.is_keep() {
            task.set_parent(parent_id.resolve(task.parent_id()))?;
        }
        if !status_id.is_keep() {
            task.set_status(status_id.resolve(task.status_id()));
        }
        task.set_responsible(responsible.resolve(task.responsible()));
        task.set_start_date(start_date.resolve(task.start_date()));
        task.set_due_date(due_date.resolve(task.due_date()));

        let saved = self.save(task, SaveMode::Update, &catalog).await?;
        if let Some(pendency) = pendency_description {
            self.open_pendency(actor, task_id, pendency).await?;
        }
        debug!("updated task");
        Ok(saved)
    }

    /// Moves a task to another status, opening a pendency when a
    /// description is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::StatusNotFound`] for an unknown target,
    /// and [`TaskLifecycleError::Domain`] when the target is the pending
    /// status and no description is given, or when transition enforcement
    /// is on and the graph has no edge to the target.
    #[instrument(
        skip_all,
        fields(actor = %actor, task_id = %request.task_id, status_id = %request.status_id)
    )]
    pub async fn change_status(
        &self,
        actor: UserId,
        request: ChangeStatusRequest,
    ) -> TaskLifecycleResult<Task> {
        let ChangeStatusRequest {
            task_id,
            status_id,
            pendency_description: raw_pendency,
        } = request;
        let pendency_description = normalize_description(raw_pendency);
        let catalog = self.registry.catalog().await?;

        let _guard = self.lock_trees(&[task_id]).await?;
        let mut task = self.require_task(task_id).await?;
        self.check_status_change(&catalog, &task, status_id, pendency_description.as_ref())?;

        task.set_status(Some(status_id));
        let saved = self.save(task, SaveMode::Update, &catalog).await?;
        if let Some(pendency) = pendency_description {
            self.open_pendency(actor, task_id, pendency).await?;
        }
        info!("changed task status");
        Ok(saved)
    }

    /// Makes `actor` the responsible user of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist.
    #[instrument(skip_all, fields(actor = %actor, task_id = %task_id))]
    pub async fn assign_responsible(&self, actor: UserId, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let catalog = self.registry.catalog().await?;
        let _guard = self.lock_trees(&[task_id]).await?;
        let mut task = self.require_task(task_id).await?;
        task.set_responsible(Some(actor));
        self.save(task, SaveMode::Update, &catalog).await
    }

    /// Deletes a task and its pendencies.
    ///
    /// Children are detached to the top level instead of being deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist.
    #[instrument(skip_all, fields(task_id = %task_id))]
    pub async fn delete_task(&self, task_id: TaskId) -> TaskLifecycleResult<()> {
        let _guard = self.lock_trees(&[task_id]).await?;
        self.require_task(task_id).await?;

        for mut child in self.repository.find_children(task_id).await? {
            child.set_parent(None)?;
            child.touch(&*self.clock);
            self.repository.update(&child).await?;
        }
        self.repository.delete(task_id).await?;
        info!("deleted task");
        Ok(())
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn get_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.require_task(task_id).await
    }

    /// Lists the direct children of a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn list_children(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<Task>> {
        self.require_task(task_id).await?;
        Ok(self.repository.find_children(task_id).await?)
    }

    /// Classifies a task's due date against today's date.
    #[must_use]
    pub fn deadline_status(&self, task: &Task) -> DeadlineStatus {
        task.deadline_status(self.today())
    }

    /// Builds a health report covering the registry's role assignment and
    /// the engine's event counters.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Registry`] when the catalog cannot be
    /// loaded.
    pub async fn health_report(&self) -> TaskLifecycleResult<HealthReport> {
        Ok(self.registry.health_report().await?)
    }

    pub(super) fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Runs the save pipeline. Callers must hold the task's tree lock.
    pub(super) async fn save(
        &self,
        mut task: Task,
        mode: SaveMode,
        catalog: &StatusCatalog,
    ) -> TaskLifecycleResult<Task> {
        let today = self.today();
        resolver::resolve(&mut task, catalog, &self.config);
        resolver::settle_closure(&mut task, catalog, today);

        match mode {
            SaveMode::Insert => self.repository.store(&task).await?,
            SaveMode::Update => {
                task.touch(&*self.clock);
                self.repository.update(&task).await?;
            }
        }

        if task.parent_id().is_some() && catalog.role_holder(StatusRole::Final).is_none() {
            warn!(
                task_id = %task.id(),
                role = %StatusRole::Final,
                "no status holds the role; ancestors will not auto-close"
            );
        } else if catalog.is_terminal(task.status_id()) {
            let cascade = Cascade {
                repository: &*self.repository,
                catalog,
                clock: &*self.clock,
                config: &self.config,
                health: &self.health,
            };
            let finalized = cascade.run(&task, today).await?;
            if !finalized.is_empty() {
                debug!(task_id = %task.id(), ancestors = finalized.len(), "cascade finished");
            }
        }
        Ok(task)
    }

    /// Locks the trees containing `anchors`, retrying while a concurrent
    /// reparent moves one of them to another root.
    pub(super) async fn lock_trees(&self, anchors: &[TaskId]) -> TaskLifecycleResult<SubtreeGuard> {
        for attempt in 1..=MAX_LOCK_ATTEMPTS {
            let roots = self.roots_of(anchors).await?;
            let guard = self.locks.lock(&roots).await;
            if self.roots_of(anchors).await? == roots {
                return Ok(guard);
            }
            drop(guard);
            debug!(attempt, "tree root moved while locking, retrying");
        }
        warn!(anchors = ?anchors, "gave up locking a tree that keeps moving");
        Err(TaskLifecycleError::Contention {
            attempts: MAX_LOCK_ATTEMPTS,
        })
    }

    pub(super) async fn require_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }

    pub(super) async fn open_pendency(
        &self,
        actor: UserId,
        task_id: TaskId,
        description: PendencyDescription,
    ) -> TaskLifecycleResult<Pendency> {
        let pendency = Pendency::new(task_id, description, Some(actor), &*self.clock);
        self.repository.store_pendency(&pendency).await?;
        info!(pendency_id = %pendency.id(), %task_id, "opened pendency");
        Ok(pendency)
    }

    async fn roots_of(&self, anchors: &[TaskId]) -> TaskLifecycleResult<BTreeSet<TaskId>> {
        let mut roots = BTreeSet::new();
        for anchor in anchors {
            let ancestors = self.ancestors(*anchor).await?;
            roots.insert(ancestors.last().copied().unwrap_or(*anchor));
        }
        Ok(roots)
    }

    async fn ancestors(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<TaskId>> {
        match self.repository.ancestor_ids(task_id).await {
            Ok(ancestors) => Ok(ancestors),
            Err(TaskRepositoryError::CycleDetected(id)) => {
                self.health.record_invariant_violation();
                error!(task_id = %id, "parent chain contains a cycle; a write bypassed validation");
                Err(TaskRepositoryError::CycleDetected(id).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure_not_descendant(&self, task_id: TaskId, new_parent: TaskId) -> TaskLifecycleResult<()> {
        if new_parent == task_id {
            return Err(TaskDomainError::SelfParent(task_id).into());
        }
        if self.ancestors(new_parent).await?.contains(&task_id) {
            return Err(TaskDomainError::AncestorCycle {
                task_id,
                parent_id: new_parent,
            }
            .into());
        }
        Ok(())
    }

    fn check_status_change(
        &self,
        catalog: &StatusCatalog,
        task: &Task,
        target: StatusId,
        pendency_description: Option<&PendencyDescription>,
    ) -> TaskLifecycleResult<()> {
        let target_status = Self::require_known_status(catalog, target)?;
        let current = task.status_id();
        if current == Some(target) {
            return Ok(());
        }

        if self.config.enforce_transitions
            && let Some(from) = current.and_then(|id| catalog.find(id))
            && !from.allows_transition_to(target)
        {
            return Err(TaskDomainError::TransitionNotAllowed {
                from: from.id(),
                to: target,
            }
            .into());
        }
        if target_status.is_pending() && pendency_description.is_none() {
            return Err(TaskDomainError::PendencyDescriptionRequired(task.id()).into());
        }
        Ok(())
    }

    fn require_known_status(
        catalog: &StatusCatalog,
        id: StatusId,
    ) -> TaskLifecycleResult<&Status> {
        catalog.find(id).ok_or(TaskLifecycleError::StatusNotFound(id))
    }
}

/// Treats a blank description as absent.
fn normalize_description(raw: Option<String>) -> Option<PendencyDescription> {
    raw.and_then(|value| PendencyDescription::new(value).ok())
}
