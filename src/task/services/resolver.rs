//! Default and derivation rules applied to a task before every save.

use crate::config::EngineConfig;
use crate::status::services::StatusCatalog;
use crate::status::domain::StatusRole;
use crate::task::domain::Task;
use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

/// Fills the gaps a caller left open.
///
/// A task without a status receives the default-role status, when one is
/// configured. A task with a start date but no due date receives a due date
/// `due_date_offset_days` after the start. Values that are already present
/// are never overridden.
pub(crate) fn resolve(task: &mut Task, catalog: &StatusCatalog, config: &EngineConfig) {
    if task.status_id().is_none() {
        match catalog.role_holder(StatusRole::Default) {
            Some(default) => task.set_status(Some(default.id())),
            None => debug!(task_id = %task.id(), "no default status configured"),
        }
    }

    derive_due_date(task, config);
}

/// Sets the due date from the start date when the due date is absent.
pub(crate) fn derive_due_date(task: &mut Task, config: &EngineConfig) {
    let (Some(start), None) = (task.start_date(), task.due_date()) else {
        return;
    };

    match start.checked_add_days(Days::new(u64::from(config.due_date_offset_days))) {
        Some(due) => task.set_due_date(Some(due)),
        None => warn!(task_id = %task.id(), %start, "derived due date is out of range"),
    }
}

/// Keeps the closure date consistent with the task's terminal state.
///
/// A terminal task without a closure date is closed `today`; a non-terminal
/// task has no closure date.
pub(crate) fn settle_closure(task: &mut Task, catalog: &StatusCatalog, today: NaiveDate) {
    if catalog.is_terminal(task.status_id()) {
        if task.closure_date().is_none() {
            task.set_closure_date(Some(today));
        }
    } else {
        task.set_closure_date(None);
    }
}
