//! Given steps for task cascade BDD scenarios.

use super::world::{CascadeWorld, run_async};
use demandhub::{
    status::{domain::StatusRole, services::CreateStatusRequest},
    task::services::CreateTaskRequest,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("a workflow with one status per role")]
fn workflow(world: &mut CascadeWorld) -> Result<(), eyre::Report> {
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

#[given(r#"a parent task "{parent}" with children "{first}" and "{second}""#)]
fn parent_with_children(
    world: &mut CascadeWorld,
    parent: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let created_parent = run_async(
        world
            .service
            .create_task(world.actor, CreateTaskRequest::new(parent.as_str())),
    )
    .wrap_err("create parent task")?;
    world.parent = Some(created_parent.id());
    world.tasks.insert(parent, created_parent.id());

    for title in [first, second] {
        let child = run_async(world.service.create_task(
            world.actor,
            CreateTaskRequest::new(title.as_str()).with_parent(created_parent.id()),
        ))
        .wrap_err("create child task")?;
        world.tasks.insert(title, child.id());
    }
    Ok(())
}
