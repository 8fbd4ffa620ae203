//! Status repository tests against `PostgreSQL`.

use super::helpers::{TestDatabase, database};
use demandhub::status::{
    domain::{Status, StatusColor, StatusName, StatusRole},
    ports::StatusRepository,
};
use mockable::DefaultClock;
use rstest::rstest;

fn status(name: &str) -> Result<Status, eyre::Report> {
    Ok(Status::new(
        StatusName::new(name)?,
        StatusColor::new("#6c757d")?,
        &DefaultClock,
    ))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assigning_a_role_revokes_it_elsewhere(
    database: Option<TestDatabase>,
) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let repository = db.statuses();
    let first = status("Done")?;
    let second = status("Archived")?;
    repository.store(&first).await?;
    repository.store(&second).await?;

    repository.assign_role(first.id(), StatusRole::Final).await?;
    let revoked = repository.assign_role(second.id(), StatusRole::Final).await?;

    eyre::ensure!(revoked == vec![first.id()], "unexpected revocations {revoked:?}");
    let holders: Vec<_> = repository
        .find_by_role(StatusRole::Final)
        .await?
        .iter()
        .map(Status::id)
        .collect();
    eyre::ensure!(holders == vec![second.id()], "unexpected holders {holders:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bypassing_writes_cannot_create_a_second_holder(
    database: Option<TestDatabase>,
) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let repository = db.statuses();
    let first = status("Open")?;
    let second = status("New")?;
    repository.store(&first).await?;
    repository.store(&second).await?;
    repository.assign_role(first.id(), StatusRole::Default).await?;

    let result = db.execute(&format!(
        "UPDATE statuses SET is_default = TRUE WHERE id = '{}'",
        second.id()
    ));

    eyre::ensure!(result.is_err(), "the partial unique index should reject it");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_stores_transitions_but_not_roles(
    database: Option<TestDatabase>,
) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let repository = db.statuses();
    let open = status("Open")?;
    let done = status("Done")?;
    repository.store(&open).await?;
    repository.store(&done).await?;
    repository.assign_role(open.id(), StatusRole::Default).await?;

    // `open` is a stale copy without the default role.
    let mut edited = open.clone();
    edited.allow_transition_to(done.id(), &DefaultClock);
    repository.update(&edited).await?;

    let stored = repository
        .find_by_id(open.id())
        .await?
        .ok_or_else(|| eyre::eyre!("status should exist"))?;
    eyre::ensure!(stored.allows_transition_to(done.id()), "edge should persist");
    eyre::ensure!(stored.is_default(), "update must not revoke the role");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clear_role_leaves_it_unheld(database: Option<TestDatabase>) -> Result<(), eyre::Report> {
    let Some(db) = database else {
        return Ok(());
    };
    let repository = db.statuses();
    let pending = status("Waiting")?;
    repository.store(&pending).await?;
    repository.assign_role(pending.id(), StatusRole::Pending).await?;

    let revoked = repository.clear_role(StatusRole::Pending).await?;

    eyre::ensure!(revoked == vec![pending.id()], "unexpected revocations {revoked:?}");
    eyre::ensure!(
        repository.find_by_role(StatusRole::Pending).await?.is_empty(),
        "role should be unheld"
    );
    Ok(())
}
