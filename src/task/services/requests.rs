//! Request payloads accepted by the task lifecycle service.

use crate::status::domain::StatusId;
use crate::task::domain::{Patch, TaskId, TaskLevel, UserId};
use chrono::NaiveDate;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(crate) title: String,
    pub(crate) level: TaskLevel,
    pub(crate) description: String,
    pub(crate) observation: String,
    pub(crate) parent_id: Option<TaskId>,
    pub(crate) status_id: Option<StatusId>,
    pub(crate) responsible: Option<UserId>,
    pub(crate) start_date: Option<NaiveDate>,
    pub(crate) due_date: Option<NaiveDate>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: TaskLevel::default(),
            description: String::new(),
            observation: String::new(),
            parent_id: None,
            status_id: None,
            responsible: None,
            start_date: None,
            due_date: None,
        }
    }

    /// Sets the hierarchy level.
    #[must_use]
    pub const fn with_level(mut self, level: TaskLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the free-form observation.
    #[must_use]
    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = observation.into();
        self
    }

    /// Places the task under `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets an explicit initial status instead of the default one.
    #[must_use]
    pub const fn with_status(mut self, status_id: StatusId) -> Self {
        self.status_id = Some(status_id);
        self
    }

    /// Sets the responsible user.
    #[must_use]
    pub const fn with_responsible(mut self, responsible: UserId) -> Self {
        self.responsible = Some(responsible);
        self
    }

    /// Sets the start date.
    #[must_use]
    pub const fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Request payload for editing a task.
///
/// Fields left untouched keep their stored value. Optional fields take an
/// `Option`: `Some` sets a value and `None` clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub(crate) task_id: TaskId,
    pub(crate) title: Option<String>,
    pub(crate) level: Option<TaskLevel>,
    pub(crate) description: Option<String>,
    pub(crate) observation: Option<String>,
    pub(crate) parent_id: Patch<TaskId>,
    pub(crate) status_id: Patch<StatusId>,
    pub(crate) responsible: Patch<UserId>,
    pub(crate) start_date: Patch<NaiveDate>,
    pub(crate) due_date: Patch<NaiveDate>,
    pub(crate) pendency_description: Option<String>,
}

impl UpdateTaskRequest {
    /// Creates a request that changes nothing yet.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            title: None,
            level: None,
            description: None,
            observation: None,
            parent_id: Patch::Keep,
            status_id: Patch::Keep,
            responsible: Patch::Keep,
            start_date: Patch::Keep,
            due_date: Patch::Keep,
            pendency_description: None,
        }
    }

    /// Sets a new title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a new hierarchy level.
    #[must_use]
    pub const fn with_level(mut self, level: TaskLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the observation.
    #[must_use]
    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = Some(observation.into());
        self
    }

    /// Moves the task under another parent, or to the top level on `None`.
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<TaskId>) -> Self {
        self.parent_id = parent_id.into();
        self
    }

    /// Sets or clears the status. A cleared status falls back to the
    /// default one on save.
    #[must_use]
    pub fn with_status(mut self, status_id: Option<StatusId>) -> Self {
        self.status_id = status_id.into();
        self
    }

    /// Sets or clears the responsible user.
    #[must_use]
    pub fn with_responsible(mut self, responsible: Option<UserId>) -> Self {
        self.responsible = responsible.into();
        self
    }

    /// Sets or clears the start date.
    #[must_use]
    pub fn with_start_date(mut self, start_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date.into();
        self
    }

    /// Sets or clears the due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date.into();
        self
    }

    /// Describes the pendency opened when the status moves to pending.
    #[must_use]
    pub fn with_pendency_description(mut self, description: impl Into<String>) -> Self {
        self.pendency_description = Some(description.into());
        self
    }
}

/// Request payload for moving a task to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeStatusRequest {
    pub(crate) task_id: TaskId,
    pub(crate) status_id: StatusId,
    pub(crate) pendency_description: Option<String>,
}

impl ChangeStatusRequest {
    /// Creates a request moving `task_id` to `status_id`.
    #[must_use]
    pub const fn new(task_id: TaskId, status_id: StatusId) -> Self {
        Self {
            task_id,
            status_id,
            pendency_description: None,
        }
    }

    /// Describes the pendency to open alongside the move.
    ///
    /// Required when the target is the pending status.
    #[must_use]
    pub fn with_pendency_description(mut self, description: impl Into<String>) -> Self {
        self.pendency_description = Some(description.into());
        self
    }
}
