//! End-to-end lifecycle tests over the in-memory adapters.

use super::helpers::{workflow, workflow_with};
use demandhub::{
    config::EngineConfig,
    health::HealthStatus,
    task::{
        domain::TaskLevel,
        services::{ChangeStatusRequest, CreateTaskRequest, TaskLifecycleError},
    },
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn project_tree_closes_bottom_up() -> Result<(), eyre::Report> {
    let flow = workflow().await?;
    let service = &flow.service;
    let initiative = service
        .create_task(
            flow.actor,
            CreateTaskRequest::new("Open new branch office").with_level(TaskLevel::Initiative),
        )
        .await?;
    let epic = service
        .create_task(
            flow.actor,
            CreateTaskRequest::new("Hire staff")
                .with_level(TaskLevel::Epic)
                .with_parent(initiative.id()),
        )
        .await?;
    let mut stories = Vec::new();
    for title in ["Post job ads", "Run interviews"] {
        stories.push(
            service
                .create_task(
                    flow.actor,
                    CreateTaskRequest::new(title)
                        .with_level(TaskLevel::Story)
                        .with_parent(epic.id()),
                )
                .await?,
        );
    }

    for story in &stories {
        service
            .change_status(flow.actor, ChangeStatusRequest::new(story.id(), flow.statuses.done))
            .await?;
    }

    for id in [epic.id(), initiative.id()] {
        let stored = service.get_task(id).await?;
        eyre::ensure!(
            stored.status_id() == Some(flow.statuses.done),
            "task {id} should be closed"
        );
        eyre::ensure!(stored.closure_date().is_some(), "task {id} needs a closure date");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blocked_task_round_trip() -> Result<(), eyre::Report> {
    let flow = workflow().await?;
    let service = &flow.service;
    let task = service
        .create_task(flow.actor, CreateTaskRequest::new("Renew office lease"))
        .await?;
    eyre::ensure!(task.status_id() == Some(flow.statuses.open), "default status");

    let blocked = service
        .change_status(
            flow.actor,
            ChangeStatusRequest::new(task.id(), flow.statuses.waiting)
                .with_pendency_description("Landlord has not replied"),
        )
        .await?;
    eyre::ensure!(blocked.status_id() == Some(flow.statuses.waiting), "pending status");

    let pendencies = service.list_pendencies(task.id()).await?;
    let pendency = pendencies
        .first()
        .ok_or_else(|| eyre::eyre!("a pendency should be open"))?;
    service.set_pendency_resolved(pendency.id(), true).await?;
    eyre::ensure!(
        service.get_task(task.id()).await?.status_id() == Some(flow.statuses.doing),
        "resolving should resume work"
    );

    service.set_pendency_resolved(pendency.id(), false).await?;
    eyre::ensure!(
        service.get_task(task.id()).await?.status_id() == Some(flow.statuses.waiting),
        "reopening should block the task again"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strict_mode_blocks_unlisted_transitions() -> Result<(), eyre::Report> {
    let flow = workflow_with(EngineConfig::strict()).await?;
    let service = &flow.service;
    let task = service
        .create_task(flow.actor, CreateTaskRequest::new("Order furniture"))
        .await?;

    let skipped = service
        .change_status(flow.actor, ChangeStatusRequest::new(task.id(), flow.statuses.done))
        .await;
    eyre::ensure!(
        skipped.as_ref().is_err_and(TaskLifecycleError::is_validation),
        "expected a validation error, got {skipped:?}"
    );

    service
        .registry()
        .allow_transition(flow.statuses.open, flow.statuses.done)
        .await?;
    let finished = service
        .change_status(flow.actor, ChangeStatusRequest::new(task.id(), flow.statuses.done))
        .await?;
    eyre::ensure!(finished.status_id() == Some(flow.statuses.done), "edge now exists");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn healthy_workflow_reports_healthy() -> Result<(), eyre::Report> {
    let flow = workflow().await?;

    let report = flow.service.health_report().await?;

    eyre::ensure!(report.status == HealthStatus::Healthy, "unexpected {report:?}");
    eyre::ensure!(report.missing_roles.is_empty(), "no role should be missing");
    Ok(())
}
