//! Pendency operations and the Open/Resolved side effects on tasks.

use super::lifecycle::{SaveMode, TaskLifecycleService};
use super::{TaskLifecycleError, TaskLifecycleResult};
use crate::status::{domain::StatusRole, ports::StatusRepository};
use crate::task::{
    domain::{Pendency, PendencyDescription, PendencyId, PendencyTransition, TaskId, UserId},
    ports::{PendencyRepository, TaskRepository},
};
use mockable::Clock;
use tracing::{info, instrument, warn};

impl<R, S, C> TaskLifecycleService<R, S, C>
where
    R: TaskRepository + PendencyRepository,
    S: StatusRepository,
    C: Clock + Send + Sync,
{
    /// Opens a pendency on a task, stamped with `actor` as its creator.
    ///
    /// Opening a pendency does not change the task's status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for a blank description, or
    /// [`TaskLifecycleError::TaskNotFound`] when the task does not exist.
    #[instrument(skip_all, fields(actor = %actor, task_id = %task_id))]
    pub async fn create_pendency(
        &self,
        actor: UserId,
        task_id: TaskId,
        description: impl Into<String> + Send,
    ) -> TaskLifecycleResult<Pendency> {
        let description = PendencyDescription::new(description.into())?;
        let _guard = self.lock_trees(&[task_id]).await?;
        self.require_task(task_id).await?;
        self.open_pendency(actor, task_id, description).await
    }

    /// Marks a pendency resolved or open again.
    ///
    /// The direction is decided against the stored record, read under the
    /// tree lock. Resolving moves the task to the executing status;
    /// reopening moves it to the pending status. Either move clears the
    /// task's closure date. When the target role is unassigned the pendency
    /// still changes state, the task is left alone, and the skip is counted
    /// in the health report. Writes that do not change the state have no
    /// side effect.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::PendencyNotFound`] when the pendency
    /// does not exist.
    #[instrument(skip_all, fields(pendency_id = %pendency_id, resolved = resolved))]
    pub async fn set_pendency_resolved(
        &self,
        pendency_id: PendencyId,
        resolved: bool,
    ) -> TaskLifecycleResult<Pendency> {
        let task_id = self.require_pendency(pendency_id).await?.task_id();
        let _guard = self.lock_trees(&[task_id]).await?;

        let mut pendency = self.require_pendency(pendency_id).await?;
        let transition = pendency.set_resolved(resolved, &*self.clock);
        if transition == PendencyTransition::Unchanged {
            return Ok(pendency);
        }
        self.repository.update_pendency(&pendency).await?;

        let role = match transition {
            PendencyTransition::Resolved => StatusRole::Executing,
            _ => StatusRole::Pending,
        };
        let catalog = self.registry.catalog().await?;
        let Some(target) = catalog.role_holder(role) else {
            self.health.record_skipped_pendency_effect();
            warn!(
                task_id = %pendency.task_id(),
                role = %role,
                "no status holds the role; task status left unchanged"
            );
            return Ok(pendency);
        };

        let mut task = self.require_task(pendency.task_id()).await?;
        task.set_status(Some(target.id()));
        task.set_closure_date(None);
        self.save(task, SaveMode::Update, &catalog).await?;
        info!(
            task_id = %pendency.task_id(),
            status_id = %target.id(),
            ?transition,
            "pendency moved task"
        );
        Ok(pendency)
    }

    /// Replaces a pendency's description without touching its state.
    ///
    /// The record is re-read under the tree lock, so a concurrent resolve is
    /// never overwritten with the state seen before it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for a blank description, or
    /// [`TaskLifecycleError::PendencyNotFound`] when the pendency does not
    /// exist.
    #[instrument(skip_all, fields(pendency_id = %pendency_id))]
    pub async fn update_pendency_description(
        &self,
        pendency_id: PendencyId,
        description: impl Into<String> + Send,
    ) -> TaskLifecycleResult<Pendency> {
        let new_description = PendencyDescription::new(description.into())?;
        let task_id = self.require_pendency(pendency_id).await?.task_id();
        let _guard = self.lock_trees(&[task_id]).await?;

        let mut pendency = self.require_pendency(pendency_id).await?;
        pendency.set_description(new_description);
        self.repository.update_pendency(&pendency).await?;
        Ok(pendency)
    }

    /// Retrieves a pendency by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::PendencyNotFound`] when the pendency
    /// does not exist.
    pub async fn get_pendency(&self, pendency_id: PendencyId) -> TaskLifecycleResult<Pendency> {
        self.require_pendency(pendency_id).await
    }

    /// Lists a task's pendencies, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn list_pendencies(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<Pendency>> {
        self.require_task(task_id).await?;
        Ok(self.repository.find_pendencies_by_task(task_id).await?)
    }

    async fn require_pendency(&self, pendency_id: PendencyId) -> TaskLifecycleResult<Pendency> {
        self.repository
            .find_pendency_by_id(pendency_id)
            .await?
            .ok_or(TaskLifecycleError::PendencyNotFound(pendency_id))
    }
}
