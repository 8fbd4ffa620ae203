//! Read-only snapshot of the status registry.

use crate::status::domain::{Status, StatusId, StatusRole};

/// Immutable view of every status at one point in time.
///
/// Snapshots handed out by the registry have already been checked for the
/// single-holder role invariant, so [`Self::role_holder`] is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCatalog {
    statuses: Vec<Status>,
}

impl StatusCatalog {
    /// Wraps a list of statuses.
    #[must_use]
    pub const fn new(statuses: Vec<Status>) -> Self {
        Self { statuses }
    }

    /// Returns every status in repository order.
    #[must_use]
    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Finds a status by identifier.
    #[must_use]
    pub fn find(&self, id: StatusId) -> Option<&Status> {
        self.statuses.iter().find(|status| status.id() == id)
    }

    /// Returns the status holding `role`, if any.
    #[must_use]
    pub fn role_holder(&self, role: StatusRole) -> Option<&Status> {
        self.holders(role).into_iter().next()
    }

    /// Returns whether a task in `status_id` is terminal.
    ///
    /// A task without a status, or whose status is unknown, is not terminal.
    #[must_use]
    pub fn is_terminal(&self, status_id: Option<StatusId>) -> bool {
        status_id
            .and_then(|id| self.find(id))
            .is_some_and(Status::is_final)
    }

    /// Returns the roles no status currently holds.
    #[must_use]
    pub fn unheld_roles(&self) -> Vec<StatusRole> {
        StatusRole::ALL
            .into_iter()
            .filter(|role| self.role_holder(*role).is_none())
            .collect()
    }

    /// Returns every role held by more than one status, with its holders
    /// sorted by identifier.
    pub(crate) fn violations(&self) -> Vec<(StatusRole, Vec<StatusId>)> {
        StatusRole::ALL
            .into_iter()
            .filter_map(|role| {
                let holders = self.holders(role);
                (holders.len() > 1).then(|| (role, holders.iter().map(|s| s.id()).collect()))
            })
            .collect()
    }

    fn holders(&self, role: StatusRole) -> Vec<&Status> {
        let mut holders: Vec<&Status> = self
            .statuses
            .iter()
            .filter(|status| status.has_role(role))
            .collect();
        holders.sort_by_key(|status| status.id());
        holders
    }
}
