//! Then steps for batch status update BDD scenarios.

use super::world::BatchWorld;
use rstest_bdd_macros::then;
use tasklane::batch::domain::BatchErrorKind;

#[then("{updated:u64} of {total:u64} tasks are updated")]
fn tasks_are_updated(world: &BatchWorld, updated: u64, total: u64) -> Result<(), eyre::Report> {
    let result = world.result()?;
    let updated = usize::try_from(updated)?;
    let total = usize::try_from(total)?;

    if result.total_count() != total || result.success_count() != updated {
        return Err(eyre::eyre!(
            "expected {updated} of {total}, got {} of {}",
            result.success_count(),
            result.total_count()
        ));
    }
    if result.success_count() + result.failure_count() != result.total_count() {
        return Err(eyre::eyre!("successes and failures do not add up to the total"));
    }

    Ok(())
}

#[then("the run is completely successful")]
fn run_completely_successful(world: &BatchWorld) -> Result<(), eyre::Report> {
    let result = world.result()?;
    if !result.is_completely_successful() {
        return Err(eyre::eyre!("run reported errors: {:?}", result.errors()));
    }
    Ok(())
}

#[then("the only error names the missing task")]
fn only_error_names_missing(world: &BatchWorld) -> Result<(), eyre::Report> {
    let result = world.result()?;
    let missing = world
        .missing_id
        .ok_or_else(|| eyre::eyre!("scenario did not add a missing task"))?;

    match result.errors() {
        [error] if error.task_id() == Some(missing) && error.kind() == BatchErrorKind::NotFound => {
            Ok(())
        }
        errors => Err(eyre::eyre!("unexpected errors: {errors:?}")),
    }
}

#[then("at least {retries:u64} retry is reported")]
fn retries_reported(world: &BatchWorld, retries: u64) -> Result<(), eyre::Report> {
    let result = world.result()?;
    if u64::try_from(result.retry_count())? < retries {
        return Err(eyre::eyre!(
            "expected at least {retries} retries, got {}",
            result.retry_count()
        ));
    }
    Ok(())
}

#[then("progress was reported")]
fn progress_was_reported(world: &BatchWorld) -> Result<(), eyre::Report> {
    let sink = world
        .progress
        .as_ref()
        .ok_or_else(|| eyre::eyre!("progress was not recorded in this scenario"))?;
    if sink.snapshots().is_empty() {
        return Err(eyre::eyre!("no progress snapshots were delivered"));
    }
    Ok(())
}

#[then("the last progress snapshot covers every task")]
fn last_snapshot_covers_every_task(world: &BatchWorld) -> Result<(), eyre::Report> {
    let sink = world
        .progress
        .as_ref()
        .ok_or_else(|| eyre::eyre!("progress was not recorded in this scenario"))?;
    let last = sink
        .last()
        .ok_or_else(|| eyre::eyre!("no progress snapshots were delivered"))?;
    if last.processed_tasks != last.total_tasks || last.total_tasks != world.task_ids.len() {
        return Err(eyre::eyre!("final snapshot is incomplete: {last:?}"));
    }
    Ok(())
}

#[then("every error is a business rule violation")]
fn every_error_is_rule_violation(world: &BatchWorld) -> Result<(), eyre::Report> {
    let result = world.result()?;
    if result.errors().is_empty()
        || !result
            .errors()
            .iter()
            .all(|error| error.is_business_rule_violation())
    {
        return Err(eyre::eyre!("unexpected errors: {:?}", result.errors()));
    }
    Ok(())
}
