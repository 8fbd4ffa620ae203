//! Upward propagation of finalisation from children to ancestors.

use crate::config::EngineConfig;
use crate::health::EngineHealth;
use crate::status::domain::StatusRole;
use crate::status::services::StatusCatalog;
use crate::task::{
    domain::Task,
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use chrono::NaiveDate;
use mockable::Clock;
use tracing::{debug, error, info};

use super::resolver;

/// One cascade walk over the ancestors of a freshly saved terminal task.
///
/// Callers must hold the lock of the task's tree for the whole walk.
pub(crate) struct Cascade<'a, R, C> {
    pub(crate) repository: &'a R,
    pub(crate) catalog: &'a StatusCatalog,
    pub(crate) clock: &'a C,
    pub(crate) config: &'a EngineConfig,
    pub(crate) health: &'a EngineHealth,
}

impl<R, C> Cascade<'_, R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Finalises every ancestor whose direct children are all terminal,
    /// stopping at the first one that still has open work.
    ///
    /// Returns the ancestors that were updated, nearest first.
    pub(crate) async fn run(&self, task: &Task, today: NaiveDate) -> TaskRepositoryResult<Vec<Task>> {
        let Some(final_status) = self.catalog.role_holder(StatusRole::Final) else {
            return Ok(Vec::new());
        };

        let mut finalized = Vec::new();
        let mut current = task.parent_id();
        while let Some(parent_id) = current {
            if finalized.len() >= self.config.max_cascade_depth {
                self.health.record_halted_cascade();
                error!(
                    task_id = %task.id(),
                    stopped_at = %parent_id,
                    depth = finalized.len(),
                    "cascade exceeded the depth bound; the parent chain may contain a cycle"
                );
                break;
            }

            let children = self.repository.find_children(parent_id).await?;
            let Some(latest) = children
                .iter()
                .map(|child| child.closure_date().unwrap_or(today))
                .max()
            else {
                break;
            };
            if !children
                .iter()
                .all(|child| self.catalog.is_terminal(child.status_id()))
            {
                debug!(%parent_id, "parent still has open children");
                break;
            }

            let mut parent = self
                .repository
                .find_by_id(parent_id)
                .await?
                .ok_or(TaskRepositoryError::NotFound(parent_id))?;
            parent.set_status(Some(final_status.id()));
            parent.set_closure_date(Some(latest));
            resolver::derive_due_date(&mut parent, self.config);
            parent.touch(self.clock);
            self.repository.update(&parent).await?;
            info!(task_id = %parent_id, closure_date = %latest, "closed parent after its last child");

            current = parent.parent_id();
            finalized.push(parent);
        }
        Ok(finalized)
    }
}
