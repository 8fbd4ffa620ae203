//! Pendency aggregate and its Open/Resolved state machine.

use super::{PendencyDescription, PendencyId, TaskId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a pendency. Both states are re-enterable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendencyState {
    /// The issue is still blocking the task.
    Open,
    /// The issue has been dealt with.
    Resolved,
}

impl PendencyState {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for PendencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a pendency state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendencyTransition {
    /// The requested state equals the committed one; no side effects.
    Unchanged,
    /// `Open -> Resolved`.
    Resolved,
    /// `Resolved -> Open`.
    Reopened,
}

/// An issue raised against a task. Pendencies form an append-only audit
/// trail and are never removed while their task exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pendency {
    id: PendencyId,
    task_id: TaskId,
    description: PendencyDescription,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
    resolved: bool,
    resolved_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted pendency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPendencyData {
    /// Persisted pendency identifier.
    pub id: PendencyId,
    /// Owning task.
    pub task_id: TaskId,
    /// Persisted description.
    pub description: PendencyDescription,
    /// Persisted creator.
    pub created_by: Option<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted resolution flag.
    pub resolved: bool,
    /// Persisted resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Pendency {
    /// Opens a new pendency against `task_id`.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        description: PendencyDescription,
        created_by: Option<UserId>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: PendencyId::new(),
            task_id,
            description,
            created_by,
            created_at: clock.utc(),
            resolved: false,
            resolved_at: None,
        }
    }

    /// Reconstructs a pendency from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPendencyData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            description: data.description,
            created_by: data.created_by,
            created_at: data.created_at,
            resolved: data.resolved,
            resolved_at: data.resolved_at,
        }
    }

    /// Returns the pendency identifier.
    #[must_use]
    pub const fn id(&self) -> PendencyId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the description.
    #[must_use]
    pub const fn description(&self) -> &PendencyDescription {
        &self.description
    }

    /// Returns the creator, if known.
    #[must_use]
    pub const fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether the pendency is resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PendencyState {
        if self.resolved {
            PendencyState::Resolved
        } else {
            PendencyState::Open
        }
    }

    /// Returns when the pendency was resolved; `None` while open.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns the whole days the pendency has been (or was) open, counted
    /// from its creation date to its resolution date or to `today`.
    #[must_use]
    pub fn days_open(&self, today: NaiveDate) -> i64 {
        let end = match (self.resolved, self.resolved_at) {
            (true, Some(resolved_at)) => resolved_at.date_naive(),
            _ => today,
        };
        (end - self.created_at.date_naive()).num_days()
    }

    /// Replaces the description. Never triggers state side effects.
    pub fn set_description(&mut self, description: PendencyDescription) {
        self.description = description;
    }

    /// Moves the pendency to the requested state.
    ///
    /// The returned transition is computed against the state this value
    /// held before the call, so callers must invoke it on a freshly loaded,
    /// committed copy.
    pub(crate) fn set_resolved(&mut self, resolved: bool, clock: &impl Clock) -> PendencyTransition {
        match (self.resolved, resolved) {
            (false, true) => {
                self.resolved = true;
                if self.resolved_at.is_none() {
                    self.resolved_at = Some(clock.utc());
                }
                PendencyTransition::Resolved
            }
            (true, false) => {
                self.resolved = false;
                self.resolved_at = None;
                PendencyTransition::Reopened
            }
            _ => PendencyTransition::Unchanged,
        }
    }
}
