//! Task lifecycle engine for the demand tracker.
//!
//! Tasks form a forest of work items that move through registry statuses.
//! Every save derives missing defaults, keeps the closure date in step with
//! the terminal status, and closes ancestors whose children are all done.
//! Pendencies attached to a task move it between the pending and executing
//! statuses as they are reopened and resolved. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
