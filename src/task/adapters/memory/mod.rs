//! In-memory adapters for task and pendency persistence.

mod task;

pub use task::InMemoryTaskRepository;
