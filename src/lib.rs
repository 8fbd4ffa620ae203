//! Demandhub: task and demand lifecycle engine.
//!
//! This crate keeps a forest of tasks moving through a configurable set of
//! statuses. It derives missing defaults on every save, closes parent tasks
//! once all of their children are finished, and moves tasks between the
//! pending and executing statuses as their pendencies are reopened and
//! resolved.
//!
//! # Architecture
//!
//! Demandhub follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Orchestration of domain rules over the ports
//!
//! # Modules
//!
//! - [`status`]: Status catalogue, transition graph, and semantic roles
//! - [`task`]: Tasks, pendencies, and the lifecycle cascade
//! - [`config`]: Engine tunables
//! - [`health`]: Degraded-mode health signal

pub mod config;
pub mod health;
pub mod status;
pub mod task;

#[cfg(test)]
pub(crate) mod test_support;
