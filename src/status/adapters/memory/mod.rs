//! In-memory adapters for status persistence.

mod status;

pub use status::InMemoryStatusRepository;
