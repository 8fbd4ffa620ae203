//! Shared world state for pendency lifecycle BDD scenarios.

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
        domain::{PendencyId, TaskId, UserId},
        services::TaskLifecycleService,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryStatusRepository, DefaultClock>;

/// Scenario world for pendency behaviour tests.
pub struct PendencyWorld {
    pub service: TestTaskService,
    pub actor: UserId,
    pub roles: HashMap<StatusRole, StatusId>,
    pub task: Option<TaskId>,
    pub pendency: Option<PendencyId>,
}

impl PendencyWorld {
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
            task: None,
            pendency: None,
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

    /// Returns the task under test.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario created no task.
    pub fn task(&self) -> Result<TaskId, eyre::Report> {
        self.task
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Returns the pendency under test.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario opened no pendency.
    pub fn pendency(&self) -> Result<PendencyId, eyre::Report> {
        self.pendency
            .ok_or_else(|| eyre::eyre!("missing pendency in scenario world"))
    }
}

impl Default for PendencyWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PendencyWorld {
    PendencyWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
