//! Sequential processing of one batch.

use super::{ProgressReporter, RetryingTaskUpdater, RunCounters, StatusChangeCommand};
use crate::batch::domain::{BatchOperationError, ProgressSnapshot};
use crate::task::{
    domain::{TaskId, TaskSummary},
    ports::TaskRepository,
};
use mockable::Clock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Everything one batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Position of the batch in the partitioned request.
    pub batch_index: usize,
    /// Updated tasks in processing order.
    pub successful: Vec<TaskSummary>,
    /// Failures in processing order.
    pub errors: Vec<BatchOperationError>,
}

/// State shared by every batch of one run.
pub struct RunContext<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Per-task updater.
    pub updater: RetryingTaskUpdater<R, C>,
    /// Change applied to every task.
    pub command: StatusChangeCommand,
    /// Run-wide counters.
    pub counters: Arc<RunCounters>,
    /// Progress delivery.
    pub reporter: ProgressReporter,
    /// Clock stamping errors and snapshots.
    pub clock: Arc<C>,
    /// Number of tasks in the run.
    pub total_tasks: usize,
    /// Signalled when the run stops waiting for its batches.
    pub cancel: CancellationToken,
}

/// Drives the updater over the ids of one batch, in order.
pub struct BatchWorker<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    context: Arc<RunContext<R, C>>,
}

impl<R, C> BatchWorker<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a worker over the run's shared state.
    #[must_use]
    pub const fn new(context: Arc<RunContext<R, C>>) -> Self {
        Self { context }
    }

    /// Processes `task_ids`, capturing every failure as data.
    ///
    /// Stops early once the run is cancelled. An outcome that arrives after
    /// cancellation is dropped without touching the counters.
    pub async fn run(&self, batch_index: usize, task_ids: &[TaskId]) -> BatchOutcome {
        let ctx = &*self.context;
        let mut outcome = BatchOutcome {
            batch_index,
            ..BatchOutcome::default()
        };

        for &task_id in task_ids {
            if ctx.cancel.is_cancelled() {
                break;
            }

            let update = ctx
                .updater
                .update(task_id, &ctx.command, &ctx.counters, &ctx.cancel)
                .await;
            // The counters may already belong to the next run.
            if ctx.cancel.is_cancelled() {
                debug!(%task_id, batch_index, "run cancelled; discarding late outcome");
                break;
            }

            let description = match update {
                Ok(updated) => {
                    ctx.counters.record_success();
                    outcome.successful.push(TaskSummary::from(&updated.task));
                    format!(
                        "task {task_id} moved to {}",
                        ctx.command.target.as_str()
                    )
                }
                Err(failure) => {
                    ctx.counters.record_failure();
                    warn!(
                        %task_id,
                        kind = failure.kind.as_str(),
                        retries = failure.retry_attempts,
                        "{}",
                        failure.message
                    );
                    let description = format!("task {task_id} failed: {}", failure.message);
                    let mut error = BatchOperationError::for_task(
                        task_id,
                        failure.kind,
                        failure.message,
                        ctx.clock.utc(),
                    )
                    .with_retry_attempts(failure.retry_attempts);
                    if let Some(cause) = failure.cause {
                        error = error.with_cause(cause);
                    }
                    outcome.errors.push(error);
                    description
                }
            };

            if ctx.reporter.is_enabled() {
                let counts = ctx.counters.snapshot();
                ctx.reporter.report(&ProgressSnapshot {
                    total_tasks: ctx.total_tasks,
                    processed_tasks: counts.processed,
                    successful_tasks: counts.succeeded,
                    failed_tasks: counts.failed,
                    current_task_id: Some(task_id),
                    description,
                    recorded_at: ctx.clock.utc(),
                });
            }
        }

        outcome
    }
}
