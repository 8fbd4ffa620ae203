//! Domain model for tasks and pendencies.
//!
//! Tasks form a forest through weak parent references. Pendencies are open
//! issues attached to exactly one task, with an Open/Resolved lifecycle.
//! Infrastructure concerns stay outside of the domain boundary.

mod error;
mod ids;
mod level;
mod patch;
mod pendency;
mod task;

pub use error::{ParseTaskLevelError, TaskDomainError};
pub use ids::{PendencyDescription, PendencyId, TaskId, TaskTitle, UserId};
pub use level::{DeadlineStatus, TaskLevel};
pub use patch::Patch;
pub use pendency::{Pendency, PendencyState, PendencyTransition, PersistedPendencyData};
pub use task::{NewTaskData, PersistedTaskData, Task};
