//! Then steps for task cascade BDD scenarios.

use super::world::{CascadeWorld, run_async};
use demandhub::status::domain::StatusRole;
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then("the parent task is finished")]
fn parent_is_finished(world: &CascadeWorld) -> Result<(), eyre::Report> {
    let parent = run_async(world.service.get_task(world.parent()?)).wrap_err("load parent")?;
    let done = world.status(StatusRole::Final)?;
    eyre::ensure!(
        parent.status_id() == Some(done),
        "expected the parent to be finished, found {:?}",
        parent.status_id()
    );
    Ok(())
}

#[then("the parent task has a closure date")]
fn parent_has_closure_date(world: &CascadeWorld) -> Result<(), eyre::Report> {
    let parent = run_async(world.service.get_task(world.parent()?)).wrap_err("load parent")?;
    eyre::ensure!(parent.closure_date().is_some(), "parent has no closure date");
    Ok(())
}

#[then("the parent task is still open")]
fn parent_is_still_open(world: &CascadeWorld) -> Result<(), eyre::Report> {
    let parent = run_async(world.service.get_task(world.parent()?)).wrap_err("load parent")?;
    let open = world.status(StatusRole::Default)?;
    eyre::ensure!(
        parent.status_id() == Some(open) && parent.closure_date().is_none(),
        "expected the parent to stay open, found {:?}",
        parent.status_id()
    );
    Ok(())
}

#[then("the change is rejected as invalid")]
fn change_is_rejected(world: &CascadeWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_change_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing status change result"))?;
    eyre::ensure!(
        result.as_ref().is_err_and(|err| err.is_validation()),
        "expected a validation error, got {result:?}"
    );
    Ok(())
}

#[then(r#"child "{title}" has no pendencies"#)]
fn child_has_no_pendencies(world: &CascadeWorld, title: String) -> Result<(), eyre::Report> {
    let pendencies = run_async(world.service.list_pendencies(world.task(&title)?))
        .wrap_err("list pendencies")?;
    eyre::ensure!(pendencies.is_empty(), "expected no pendencies, found {}", pendencies.len());
    Ok(())
}
