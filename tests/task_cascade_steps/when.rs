//! When steps for task cascade BDD scenarios.

use super::world::{CascadeWorld, run_async};
use demandhub::{status::domain::StatusRole, task::services::ChangeStatusRequest};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"child "{title}" is finished"#)]
fn child_is_finished(world: &mut CascadeWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?;
    let done = world.status(StatusRole::Final)?;
    run_async(
        world
            .service
            .change_status(world.actor, ChangeStatusRequest::new(task_id, done)),
    )
    .wrap_err("finish child task")?;
    Ok(())
}

#[when(r#"child "{title}" is moved to the pending status without a description"#)]
fn child_moved_to_pending(world: &mut CascadeWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?;
    let pending = world.status(StatusRole::Pending)?;
    let result = run_async(
        world
            .service
            .change_status(world.actor, ChangeStatusRequest::new(task_id, pending)),
    );
    world.last_change_result = Some(result);
    Ok(())
}
