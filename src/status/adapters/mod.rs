//! Adapter implementations for the status repository port.

pub mod memory;
pub mod postgres;
