//! Given steps for pendency lifecycle BDD scenarios.

use super::world::{PendencyWorld, run_async};
use demandhub::{
    status::{domain::StatusRole, services::CreateStatusRequest},
    task::services::{ChangeStatusRequest, CreateTaskRequest},
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("a workflow with one status per role")]
fn workflow(world: &mut PendencyWorld) -> Result<(), eyre::Report> {
    for (name, role) in [
        ("Open", StatusRole::Default),
        ("Waiting", StatusRole::Pending),
        ("Doing", StatusRole::Executing),
        ("Done", StatusRole::Final),
    ] {
        let registry = world.service.registry();
        let status = run_async(registry.create_status(CreateStatusRequest::new(name)))
            .wrap_err("create status for scenario")?;
        run_async(registry.assign_role(status.id(), role)).wrap_err("assign scenario role")?;
        world.roles.insert(role, status.id());
    }
    Ok(())
}

#[given(r#"a task "{title}" blocked by "{description}""#)]
fn blocked_task(
    world: &mut PendencyWorld,
    title: String,
    description: String,
) -> Result<(), eyre::Report> {
    let task = run_async(
        world
            .service
            .create_task(world.actor, CreateTaskRequest::new(title)),
    )
    .wrap_err("create task")?;
    let pending = world.status(StatusRole::Pending)?;
    run_async(world.service.change_status(
        world.actor,
        ChangeStatusRequest::new(task.id(), pending).with_pendency_description(description),
    ))
    .wrap_err("block task")?;

    let pendencies = run_async(world.service.list_pendencies(task.id()))
        .wrap_err("list pendencies")?;
    let pendency = pendencies
        .first()
        .ok_or_else(|| eyre::eyre!("blocking the task should open a pendency"))?;
    world.task = Some(task.id());
    world.pendency = Some(pendency.id());
    Ok(())
}

#[given("no status holds the executing role")]
fn executing_role_unassigned(world: &mut PendencyWorld) -> Result<(), eyre::Report> {
    run_async(world.service.registry().clear_role(StatusRole::Executing))
        .wrap_err("clear executing role")?;
    Ok(())
}
