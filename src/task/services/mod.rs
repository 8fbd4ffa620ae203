//! Application services for task lifecycle orchestration.

mod cascade;
mod error;
mod lifecycle;
mod locks;
mod pendency;
mod requests;
pub(crate) mod resolver;

pub use error::{TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::TaskLifecycleService;
pub use locks::{SubtreeGuard, SubtreeLocks};
pub use requests::{ChangeStatusRequest, CreateTaskRequest, UpdateTaskRequest};
