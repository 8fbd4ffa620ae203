//! Adapter implementations for task and pendency repository ports.

pub mod memory;
pub mod postgres;
