//! Given steps for batch status update BDD scenarios.

use std::sync::Arc;

use super::world::{BatchWorld, run_async};
use rstest_bdd_macros::given;
use tasklane::batch::adapters::RecordingProgressSink;
use tasklane::task::domain::{TaskId, TaskStatus};

#[given("{count:u64} tasks in the {status} status")]
fn tasks_in_status(world: &mut BatchWorld, count: u64, status: String) -> Result<(), eyre::Report> {
    let status = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let count = usize::try_from(count)?;
    world.task_ids = run_async(world.repository.seed(count, status));
    Ok(())
}

#[given("a missing task between them")]
fn missing_task_between(world: &mut BatchWorld) {
    let missing = TaskId::new();
    let middle = world.task_ids.len() / 2;
    world.task_ids.insert(middle, missing);
    world.missing_id = Some(missing);
}

#[given("every task conflicts on its first save")]
fn every_task_conflicts_once(world: &mut BatchWorld) {
    for id in &world.task_ids {
        world.repository.conflict_times(*id, 1);
    }
}

#[given("progress is being recorded")]
fn progress_is_recorded(world: &mut BatchWorld) {
    world.progress = Some(Arc::new(RecordingProgressSink::new()));
}
