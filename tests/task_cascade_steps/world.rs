//! Shared world state for task cascade BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use demandhub::{
    status::{
        adapters::memory::InMemoryStatusRepository,
        domain::{StatusId, StatusRole},
        services::StatusRegistryService,
    },
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Task, TaskId, UserId},
        services::{TaskLifecycleError, TaskLifecycleService},
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryStatusRepository, DefaultClock>;

/// Scenario world for cascade behaviour tests.
pub struct CascadeWorld {
    pub service: TestTaskService,
    pub actor: UserId,
    pub roles: HashMap<StatusRole, StatusId>,
    pub tasks: HashMap<String, TaskId>,
    pub parent: Option<TaskId>,
    pub last_change_result: Option<Result<Task, TaskLifecycleError>>,
}

impl CascadeWorld {
    /// Creates a world with an empty status registry.
    #[must_use]
    pub fn new() -> Self {
        let registry = StatusRegistryService::new(
            Arc::new(InMemoryStatusRepository::new()),
            Arc::new(DefaultClock),
        );
        let service = TaskLifecycleService::new(
            Arc::new(InMemoryTaskRepository::new()),
            registry,
            Arc::new(DefaultClock),
        );

        Self {
            service,
            actor: UserId::from_uuid(uuid::Uuid::new_v4()),
            roles: HashMap::new(),
            tasks: HashMap::new(),
            parent: None,
            last_change_result: None,
        }
    }

    /// Returns the status seeded for `role`.
    ///
    /// # Errors
    ///
    /// Returns an error when the workflow has not been seeded.
    pub fn status(&self, role: StatusRole) -> Result<StatusId, eyre::Report> {
        self.roles
            .get(&role)
            .copied()
            .ok_or_else(|| eyre::eyre!("no status seeded for role {role}"))
    }

    /// Returns the task created under `title`.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has that title.
    pub fn task(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(title)
            .copied()
            .ok_or_else(|| eyre::eyre!("no task titled {title} in scenario world"))
    }

    /// Returns the parent task created by the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario created no parent.
    pub fn parent(&self) -> Result<TaskId, eyre::Report> {
        self.parent
            .ok_or_else(|| eyre::eyre!("missing parent task in scenario world"))
    }
}

impl Default for CascadeWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> CascadeWorld {
    CascadeWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
