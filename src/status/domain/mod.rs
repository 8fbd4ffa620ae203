//! Domain model for the status registry.
//!
//! Statuses are the lifecycle stages tasks move through. Each status carries
//! an explicit set of semantic roles (default, pending, executing, final)
//! instead of relying on its display name, plus the directed graph of
//! statuses reachable from it.

mod error;
mod ids;
mod status;

pub use error::{ParseStatusRoleError, StatusDomainError};
pub use ids::{StatusColor, StatusId, StatusName};
pub use status::{PersistedStatusData, Status, StatusRole};
