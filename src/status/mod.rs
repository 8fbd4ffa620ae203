//! Status registry for the demand tracker.
//!
//! Holds the catalogue of lifecycle statuses, the directed graph of allowed
//! transitions between them, and the single-holder semantic roles (default,
//! pending, executing, final) the task lifecycle engine depends on. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
