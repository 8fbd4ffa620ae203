//! Task repository and lifecycle tests against `PostgreSQL`.

use std::sync::Arc;

use super::helpers::{TestDatabase, database};
use demandhub::{
    status::{
        domain::StatusRole,
        services::{CreateStatusRequest, StatusRegistryService},
    },
    task::{
        domain::{NewTaskData, Task, TaskId, TaskTitle, UserId},
        ports::{TaskRepository, TaskRepositoryError},
        services::{ChangeStatusRequest, CreateTaskRequest, TaskLifecycleService},
    },
};
use mockable::DefaultClock;
use rstest::rstest;

fn task(title: &str, parent: Option<TaskId>) -> Result<Task, eyre::Report> {
    let mut data = NewTaskData::new(TaskTitle::new(title)?);
    data.parent_id = parent;
    Ok(Task::new(data, None, &DefaultClock))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ancestors_come_back_nearest_first(
    database: Option<TestDatabase>,
) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let repository = db.tasks();
    let root = task("Release", None)?;
    let epic = task("Payments", Some(root.id()))?;
    let story = task("Checkout", Some(epic.id()))?;
    for item in [&root, &epic, &story] {
        repository.store(item).await?;
    }

    let ancestors = repository.ancestor_ids(story.id()).await?;

    eyre::ensure!(
        ancestors == vec![epic.id(), root.id()],
        "unexpected ancestors {ancestors:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ancestor_walk_reports_cycles(database: Option<TestDatabase>) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let repository = db.tasks();
    let first = task("First", None)?;
    let second = task("Second", Some(first.id()))?;
    repository.store(&first).await?;
    repository.store(&second).await?;
    db.execute(&format!(
        "UPDATE tasks SET parent_id = '{}' WHERE id = '{}'",
        second.id(),
        first.id()
    ))?;

    let result = repository.ancestor_ids(second.id()).await;

    eyre::ensure!(
        matches!(result, Err(TaskRepositoryError::CycleDetected(_))),
        "expected a cycle, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_parent_is_not_found(database: Option<TestDatabase>) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let repository = db.tasks();
    let ghost = TaskId::new();
    let orphan = task("Orphan", Some(ghost))?;

    let result = repository.store(&orphan).await;

    eyre::ensure!(
        matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == ghost),
        "expected the parent to be missing, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_cascades_through_postgres(
    database: Option<TestDatabase>,
) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let registry = StatusRegistryService::new(Arc::new(db.statuses()), Arc::new(DefaultClock));
    let mut final_status = None;
    for (name, role) in [
        ("Open", StatusRole::Default),
        ("Waiting", StatusRole::Pending),
        ("Doing", StatusRole::Executing),
        ("Done", StatusRole::Final),
    ] {
        let status = registry.create_status(CreateStatusRequest::new(name)).await?;
        registry.assign_role(status.id(), role).await?;
        if role == StatusRole::Final {
            final_status = Some(status.id());
        }
    }
    let done = final_status.ok_or_else(|| eyre::eyre!("final status should be seeded"))?;
    let service = TaskLifecycleService::new(Arc::new(db.tasks()), registry, Arc::new(DefaultClock));
    let actor = UserId::from_uuid(uuid::Uuid::new_v4());

    let parent = service
        .create_task(actor, CreateTaskRequest::new("Quarter close"))
        .await?;
    let child = service
        .create_task(actor, CreateTaskRequest::new("Reconcile").with_parent(parent.id()))
        .await?;
    service
        .create_pendency(actor, child.id(), "Missing bank statement")
        .await?;
    service
        .change_status(actor, ChangeStatusRequest::new(child.id(), done))
        .await?;

    let stored = service.get_task(parent.id()).await?;
    eyre::ensure!(stored.status_id() == Some(done), "parent should be finished");
    eyre::ensure!(stored.closure_date().is_some(), "parent needs a closure date");

    service.delete_task(child.id()).await?;
    eyre::ensure!(
        service.list_children(parent.id()).await?.is_empty(),
        "child should be gone"
    );
    Ok(())
}
