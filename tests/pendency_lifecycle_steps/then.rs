//! Then steps for pendency lifecycle BDD scenarios.

use super::world::{PendencyWorld, run_async};
use demandhub::status::domain::StatusRole;
use eyre::WrapErr;
use rstest_bdd_macros::then;

fn assert_task_role(world: &PendencyWorld, role: StatusRole) -> Result<(), eyre::Report> {
    let task = run_async(world.service.get_task(world.task()?)).wrap_err("load task")?;
    let expected = world.status(role)?;
    eyre::ensure!(
        task.status_id() == Some(expected),
        "expected the {role} status, found {:?}",
        task.status_id()
    );
    Ok(())
}

#[then("the task is in the executing status")]
fn task_is_executing(world: &PendencyWorld) -> Result<(), eyre::Report> {
    assert_task_role(world, StatusRole::Executing)
}

#[then("the task is in the pending status")]
fn task_is_pending(world: &PendencyWorld) -> Result<(), eyre::Report> {
    assert_task_role(world, StatusRole::Pending)
}

#[then("the engine reports degraded health")]
fn engine_is_degraded(world: &PendencyWorld) -> Result<(), eyre::Report> {
    let report = run_async(world.service.health_report()).wrap_err("load health report")?;
    eyre::ensure!(report.is_degraded(), "expected degraded health, got {report:?}");
    eyre::ensure!(
        report.skipped_pendency_effects == 1,
        "expected one skipped effect, got {}",
        report.skipped_pendency_effects
    );
    Ok(())
}
