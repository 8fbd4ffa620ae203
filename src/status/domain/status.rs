//! Status aggregate and semantic role types.

use super::{ParseStatusRoleError, StatusColor, StatusId, StatusName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Semantic role a status plays in the task lifecycle.
///
/// Each role is held by at most one status at a time. Role assignment is
/// owned by the status registry; repositories never change roles as a side
/// effect of ordinary updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRole {
    /// Assigned to new tasks that do not name a status.
    Default,
    /// Entered when a resolved pendency is reopened.
    Pending,
    /// Entered when a pendency is resolved.
    Executing,
    /// Marks a task as complete; drives closure dates and the cascade.
    Final,
}

impl StatusRole {
    /// Every role, in canonical order.
    pub const ALL: [Self; 4] = [Self::Default, Self::Pending, Self::Executing, Self::Final];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pending => "pending",
            Self::Executing => "executing",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for StatusRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StatusRole {
    type Error = ParseStatusRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "default" => Ok(Self::Default),
            "pending" => Ok(Self::Pending),
            "executing" => Ok(Self::Executing),
            "final" => Ok(Self::Final),
            _ => Err(ParseStatusRoleError(value.to_owned())),
        }
    }
}

/// A lifecycle stage a task can occupy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    id: StatusId,
    name: StatusName,
    color: StatusColor,
    roles: BTreeSet<StatusRole>,
    next_statuses: BTreeSet<StatusId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStatusData {
    /// Persisted status identifier.
    pub id: StatusId,
    /// Persisted display name.
    pub name: StatusName,
    /// Persisted presentation colour.
    pub color: StatusColor,
    /// Roles currently held.
    pub roles: BTreeSet<StatusRole>,
    /// Directed transition edges leaving this status.
    pub next_statuses: BTreeSet<StatusId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Status {
    /// Creates a status with no roles and no outgoing transitions.
    #[must_use]
    pub fn new(name: StatusName, color: StatusColor, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: StatusId::new(),
            name,
            color,
            roles: BTreeSet::new(),
            next_statuses: BTreeSet::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a status from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedStatusData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            color: data.color,
            roles: data.roles,
            next_statuses: data.next_statuses,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the status identifier.
    #[must_use]
    pub const fn id(&self) -> StatusId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &StatusName {
        &self.name
    }

    /// Returns the presentation colour.
    #[must_use]
    pub const fn color(&self) -> &StatusColor {
        &self.color
    }

    /// Returns the roles held by this status.
    #[must_use]
    pub const fn roles(&self) -> &BTreeSet<StatusRole> {
        &self.roles
    }

    /// Returns whether this status holds `role`.
    #[must_use]
    pub fn has_role(&self, role: StatusRole) -> bool {
        self.roles.contains(&role)
    }

    /// Returns whether this is the default status for new tasks.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.has_role(StatusRole::Default)
    }

    /// Returns whether this status represents a pending task.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.has_role(StatusRole::Pending)
    }

    /// Returns whether this status represents a task being executed.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.has_role(StatusRole::Executing)
    }

    /// Returns whether this status is terminal.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.has_role(StatusRole::Final)
    }

    /// Returns the identifiers directly reachable from this status.
    #[must_use]
    pub const fn next_statuses(&self) -> &BTreeSet<StatusId> {
        &self.next_statuses
    }

    /// Returns whether a direct transition to `target` is configured.
    #[must_use]
    pub fn allows_transition_to(&self, target: StatusId) -> bool {
        self.next_statuses.contains(&target)
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

    /// Renames the status.
    pub fn rename(&mut self, name: StatusName, clock: &impl Clock) {
        self.name = name;
        self.touch(clock);
    }

    /// Changes the presentation colour.
    pub fn recolor(&mut self, color: StatusColor, clock: &impl Clock) {
        self.color = color;
        self.touch(clock);
    }

    /// Adds a directed transition edge to `target`.
    ///
    /// Returns `false` when the edge already existed.
    pub fn allow_transition_to(&mut self, target: StatusId, clock: &impl Clock) -> bool {
        let inserted = self.next_statuses.insert(target);
        if inserted {
            self.touch(clock);
        }
        inserted
    }

    /// Removes the directed transition edge to `target`.
    ///
    /// Returns `false` when no such edge existed.
    pub fn disallow_transition_to(&mut self, target: StatusId, clock: &impl Clock) -> bool {
        let removed = self.next_statuses.remove(&target);
        if removed {
            self.touch(clock);
        }
        removed
    }

    /// Grants `role`. Only repositories apply this, on behalf of the
    /// registry's atomic role assignment.
    pub(crate) fn grant_role(&mut self, role: StatusRole) {
        self.roles.insert(role);
    }

    /// Revokes `role`. See [`Self::grant_role`].
    pub(crate) fn revoke_role(&mut self, role: StatusRole) -> bool {
        self.roles.remove(&role)
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
