//! Hierarchy level of a task.

use super::ParseTaskLevelError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Planning level of a task. Purely descriptive: the engine never requires
/// a parent to sit at a higher level than its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskLevel {
    /// Top-level strategic initiative.
    Initiative,
    /// Large body of work inside an initiative.
    Epic,
    /// User-facing story inside an epic.
    Story,
    /// Concrete unit of work.
    #[default]
    Activity,
}

impl TaskLevel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initiative => "initiative",
            Self::Epic => "epic",
            Self::Story => "story",
            Self::Activity => "activity",
        }
    }
}

impl fmt::Display for TaskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskLevel {
    type Error = ParseTaskLevelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "initiative" => Ok(Self::Initiative),
            "epic" => Ok(Self::Epic),
            "story" => Ok(Self::Story),
            "activity" => Ok(Self::Activity),
            _ => Err(ParseTaskLevelError(value.to_owned())),
        }
    }
}

/// Position of a task relative to its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// The task has no due date.
    NoDeadline,
    /// The due date is today or later.
    OnTime,
    /// The due date has passed.
    Overdue,
}

impl DeadlineStatus {
    /// Classifies `due_date` against `today`.
    #[must_use]
    pub fn evaluate(due_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        match due_date {
            None => Self::NoDeadline,
            Some(due) if due < today => Self::Overdue,
            Some(_) => Self::OnTime,
        }
    }
}
