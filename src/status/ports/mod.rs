//! Port contracts for the status registry.
//!
//! Ports define infrastructure-agnostic interfaces used by registry services.

pub mod repository;

pub use repository::{StatusRepository, StatusRepositoryError, StatusRepositoryResult};
