//! `PostgreSQL` adapters for task and pendency persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskRepository, TaskPgPool};
