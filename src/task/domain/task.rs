//! Task aggregate root.

use super::{DeadlineStatus, TaskDomainError, TaskId, TaskLevel, TaskTitle, UserId};
use crate::status::domain::StatusId;
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A node in the demand forest.
///
/// A task holds a weak reference to its parent; the parent never owns its
/// children. Status and closure date are only changed by the lifecycle
/// service, which keeps the closure date set exactly while the task sits in
/// the terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    level: TaskLevel,
    description: String,
    observation: String,
    parent_id: Option<TaskId>,
    status_id: Option<StatusId>,
    responsible: Option<UserId>,
    created_by: Option<UserId>,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    closure_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Task title.
    pub title: TaskTitle,
    /// Planning level.
    pub level: TaskLevel,
    /// Free-text description.
    pub description: String,
    /// Free-text notes.
    pub observation: String,
    /// Parent task, if any.
    pub parent_id: Option<TaskId>,
    /// Explicit status; the default status is used when absent.
    pub status_id: Option<StatusId>,
    /// User responsible for the task.
    pub responsible: Option<UserId>,
    /// Planned start date.
    pub start_date: Option<NaiveDate>,
    /// Due date; derived from the start date when absent.
    pub due_date: Option<NaiveDate>,
}

impl NewTaskData {
    /// Creates task data with only a title set.
    #[must_use]
    pub fn new(title: TaskTitle) -> Self {
        Self {
            title,
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
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted planning level.
    pub level: TaskLevel,
    /// Persisted description.
    pub description: String,
    /// Persisted notes.
    pub observation: String,
    /// Persisted parent reference.
    pub parent_id: Option<TaskId>,
    /// Persisted status reference.
    pub status_id: Option<StatusId>,
    /// Persisted responsible user.
    pub responsible: Option<UserId>,
    /// Persisted creator.
    pub created_by: Option<UserId>,
    /// Persisted start date.
    pub start_date: Option<NaiveDate>,
    /// Persisted due date.
    pub due_date: Option<NaiveDate>,
    /// Persisted closure date.
    pub closure_date: Option<NaiveDate>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task. Defaults and derived dates are applied by the
    /// lifecycle service before the task is stored.
    #[must_use]
    pub fn new(data: NewTaskData, created_by: Option<UserId>, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: data.title,
            level: data.level,
            description: data.description,
            observation: data.observation,
            parent_id: data.parent_id,
            status_id: data.status_id,
            responsible: data.responsible,
            created_by,
            start_date: data.start_date,
            due_date: data.due_date,
            closure_date: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            level: data.level,
            description: data.description,
            observation: data.observation,
            parent_id: data.parent_id,
            status_id: data.status_id,
            responsible: data.responsible,
            created_by: data.created_by,
            start_date: data.start_date,
            due_date: data.due_date,
            closure_date: data.closure_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the planning level.
    #[must_use]
    pub const fn level(&self) -> TaskLevel {
        self.level
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the free-text notes.
    #[must_use]
    pub fn observation(&self) -> &str {
        &self.observation
    }

    /// Returns the parent task, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    /// Returns the current status, if any.
    #[must_use]
    pub const fn status_id(&self) -> Option<StatusId> {
        self.status_id
    }

    /// Returns the responsible user, if any.
    #[must_use]
    pub const fn responsible(&self) -> Option<UserId> {
        self.responsible
    }

    /// Returns the user who created the task, if known.
    #[must_use]
    pub const fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    /// Returns the planned start date.
    #[must_use]
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the closure date; set only while the task is terminal.
    #[must_use]
    pub const fn closure_date(&self) -> Option<NaiveDate> {
        self.closure_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Classifies the due date against `today`.
    #[must_use]
    pub fn deadline_status(&self, today: NaiveDate) -> DeadlineStatus {
        DeadlineStatus::evaluate(self.due_date, today)
    }

    /// Replaces the title.
    pub fn set_title(&mut self, title: TaskTitle) {
        self.title = title;
    }

    /// Replaces the planning level.
    pub const fn set_level(&mut self, level: TaskLevel) {
        self.level = level;
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Replaces the notes.
    pub fn set_observation(&mut self, observation: impl Into<String>) {
        self.observation = observation.into();
    }

    /// Replaces the responsible user.
    pub const fn set_responsible(&mut self, responsible: Option<UserId>) {
        self.responsible = responsible;
    }

    /// Replaces the start date.
    pub const fn set_start_date(&mut self, start_date: Option<NaiveDate>) {
        self.start_date = start_date;
    }

    /// Replaces the due date.
    pub const fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    /// Replaces the parent reference.
    ///
    /// Only direct self-parenting is detectable here; deeper cycles are
    /// rejected by the lifecycle service, which can see the ancestor chain.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfParent`] when `parent_id` is this task.
    pub fn set_parent(&mut self, parent_id: Option<TaskId>) -> Result<(), TaskDomainError> {
        if parent_id == Some(self.id) {
            return Err(TaskDomainError::SelfParent(self.id));
        }
        self.parent_id = parent_id;
        Ok(())
    }

    pub(crate) const fn set_status(&mut self, status_id: Option<StatusId>) {
        self.status_id = status_id;
    }

    pub(crate) const fn set_closure_date(&mut self, closure_date: Option<NaiveDate>) {
        self.closure_date = closure_date;
    }

    pub(crate) fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
