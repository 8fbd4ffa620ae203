//! Port contracts for task and pendency persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod repository;

pub use repository::{
    PendencyRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
