//! Integration tests for the status registry over the in-memory adapter.

use super::helpers::{TestRegistry, registry, seed_status};
use demandhub::status::{
    domain::StatusRole,
    services::{CreateStatusRequest, UpdateStatusRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassigning_a_role_moves_it(registry: TestRegistry) -> Result<(), eyre::Report> {
    let first = seed_status(&registry, "Closed", StatusRole::Final).await?;
    let second = registry
        .create_status(CreateStatusRequest::new("Archived"))
        .await?;

    registry.set_final(second.id()).await?;

    let holder = registry
        .get_final()
        .await?
        .ok_or_else(|| eyre::eyre!("final role should be held"))?;
    eyre::ensure!(holder.id() == second.id(), "final role should move");
    let previous = registry
        .find_status(first)
        .await?
        .ok_or_else(|| eyre::eyre!("previous holder should still exist"))?;
    eyre::ensure!(!previous.is_final(), "previous holder keeps the role");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_status_may_hold_several_roles(registry: TestRegistry) -> Result<(), eyre::Report> {
    let status = seed_status(&registry, "Open", StatusRole::Default).await?;
    registry.set_pending(status).await?;

    let stored = registry
        .find_status(status)
        .await?
        .ok_or_else(|| eyre::eyre!("status should exist"))?;

    eyre::ensure!(stored.is_default() && stored.is_pending(), "both roles kept");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn edits_keep_roles_and_transitions(registry: TestRegistry) -> Result<(), eyre::Report> {
    let open = seed_status(&registry, "Open", StatusRole::Default).await?;
    let done = seed_status(&registry, "Done", StatusRole::Final).await?;
    registry.allow_transition(open, done).await?;

    let renamed = registry
        .update_status(
            UpdateStatusRequest::new(open)
                .with_name("New")
                .with_color("#112233"),
        )
        .await?;

    eyre::ensure!(renamed.name().as_str() == "New", "name should change");
    eyre::ensure!(renamed.color().as_str() == "#112233", "color should change");
    eyre::ensure!(renamed.is_default(), "role should survive the edit");
    eyre::ensure!(
        registry.can_transition(open, done).await?,
        "edge should survive the edit"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_graph_is_directed(registry: TestRegistry) -> Result<(), eyre::Report> {
    let open = seed_status(&registry, "Open", StatusRole::Default).await?;
    let done = seed_status(&registry, "Done", StatusRole::Final).await?;

    registry.allow_transition(open, done).await?;

    eyre::ensure!(registry.can_transition(open, done).await?, "forward edge");
    eyre::ensure!(!registry.can_transition(done, open).await?, "no reverse edge");
    let next: Vec<_> = registry
        .allowed_next(open)
        .await?
        .iter()
        .map(demandhub::status::domain::Status::id)
        .collect();
    eyre::ensure!(next == vec![done], "allowed_next should list the target");

    registry.disallow_transition(open, done).await?;
    eyre::ensure!(!registry.can_transition(open, done).await?, "edge removed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_lists_unheld_required_roles(registry: TestRegistry) -> Result<(), eyre::Report> {
    seed_status(&registry, "Open", StatusRole::Default).await?;
    seed_status(&registry, "Done", StatusRole::Final).await?;

    let report = registry.health_report().await?;

    eyre::ensure!(report.is_degraded(), "missing roles degrade health");
    eyre::ensure!(
        report.missing_roles == vec![StatusRole::Pending, StatusRole::Executing],
        "unexpected missing roles: {:?}",
        report.missing_roles
    );
    Ok(())
}
