//! Single-task status update with conflict retries.
//!
//! Each attempt reads the task, applies the transition rule, and performs a
//! conditional save. Attempts resolve to an [`AttemptOutcome`]; only
//! [`AttemptOutcome::Conflict`] is retried, after a backoff of
//! `base × 2^(attempt - 1)`.

use super::RunCounters;
use crate::batch::domain::{BatchErrorKind, BatchUpdateRequest};
use crate::task::{
    domain::{Task, TaskDomainError, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Status change applied to every task of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeCommand {
    /// Status to move to.
    pub target: TaskStatus,
    /// Acting user recorded on the change.
    pub requested_by: String,
    /// Reason recorded on the change.
    pub reason: Option<String>,
    /// Conflict retries allowed per task.
    pub max_retries: u32,
}

impl From<&BatchUpdateRequest> for StatusChangeCommand {
    fn from(request: &BatchUpdateRequest) -> Self {
        Self {
            target: request.target_status(),
            requested_by: request.requested_by().to_owned(),
            reason: request.reason().map(str::to_owned),
            max_retries: request.max_retries(),
        }
    }
}

/// Result of one read-validate-save attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The change was persisted.
    Updated(Task),
    /// The task does not exist.
    NotFound,
    /// The transition rule rejected the change.
    RuleViolation(TaskDomainError),
    /// The conditional save lost a race.
    Conflict(TaskRepositoryError),
    /// The repository failed otherwise.
    Failed(TaskRepositoryError),
}

/// A task persisted in its new status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedTask {
    /// Task as stored after the write.
    pub task: Task,
    /// Conflict retries spent before the write succeeded.
    pub retries: u32,
}

/// Terminal failure for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    /// Failure classification.
    pub kind: BatchErrorKind,
    /// Human-readable summary.
    pub message: String,
    /// Originating error text.
    pub cause: Option<String>,
    /// Conflict retries spent before giving up.
    pub retry_attempts: u32,
}

impl UpdateFailure {
    fn new(kind: BatchErrorKind, message: String, retry_attempts: u32) -> Self {
        Self {
            kind,
            message,
            cause: None,
            retry_attempts,
        }
    }

    fn with_cause(mut self, cause: &impl ToString) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

/// Returns the wait before the retry that follows `attempt`.
///
/// Attempts are numbered from one, so the first retry waits `base`.
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1_u32
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// Applies one status change to one task, retrying conflicts.
pub struct RetryingTaskUpdater<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    base_backoff: Duration,
}

impl<R, C> RetryingTaskUpdater<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates an updater.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, base_backoff: Duration) -> Self {
        Self {
            repository,
            clock,
            base_backoff,
        }
    }

    /// Performs one read-validate-save attempt.
    ///
    /// Writes only when the transition rule accepts the change.
    pub async fn attempt(&self, task_id: TaskId, command: &StatusChangeCommand) -> AttemptOutcome {
        let mut task = match self.repository.find_by_id(task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => return AttemptOutcome::NotFound,
            Err(err) => return AttemptOutcome::Failed(err),
        };

        if let Err(err) = task.transition_to(
            command.target,
            &command.requested_by,
            command.reason.as_deref(),
            &*self.clock,
        ) {
            return AttemptOutcome::RuleViolation(err);
        }

        match self.repository.save(&task).await {
            Ok(saved) => AttemptOutcome::Updated(saved),
            Err(err) if err.is_conflict() => AttemptOutcome::Conflict(err),
            Err(TaskRepositoryError::NotFound(_)) => AttemptOutcome::NotFound,
            Err(err) => AttemptOutcome::Failed(err),
        }
    }

    /// Drives attempts until the task is updated or fails terminally.
    ///
    /// Conflict retries are counted on `counters`. Cancelling `cancel`
    /// during a backoff ends the loop with
    /// [`BatchErrorKind::Interrupted`].
    ///
    /// # Errors
    ///
    /// Returns [`UpdateFailure`] for missing tasks, rejected transitions,
    /// repository failures, exhausted conflict retries, and interrupted
    /// backoffs.
    pub async fn update(
        &self,
        task_id: TaskId,
        command: &StatusChangeCommand,
        counters: &RunCounters,
        cancel: &CancellationToken,
    ) -> Result<UpdatedTask, UpdateFailure> {
        let mut attempt: u32 = 1;
        loop {
            let retries = attempt.saturating_sub(1);
            match self.attempt(task_id, command).await {
                AttemptOutcome::Updated(task) => return Ok(UpdatedTask { task, retries }),
                AttemptOutcome::NotFound => {
                    return Err(UpdateFailure::new(
                        BatchErrorKind::NotFound,
                        format!("task {task_id} not found"),
                        retries,
                    ));
                }
                AttemptOutcome::RuleViolation(err) => {
                    return Err(UpdateFailure::new(
                        BatchErrorKind::RuleViolation,
                        format!(
                            "task {task_id} cannot move to {}",
                            command.target.as_str()
                        ),
                        retries,
                    )
                    .with_cause(&err));
                }
                AttemptOutcome::Failed(err) => {
                    return Err(UpdateFailure::new(
                        BatchErrorKind::Persistence,
                        format!("task {task_id} could not be persisted"),
                        retries,
                    )
                    .with_cause(&err));
                }
                AttemptOutcome::Conflict(err) => {
                    if attempt > command.max_retries {
                        return Err(UpdateFailure::new(
                            BatchErrorKind::ConcurrencyConflict,
                            format!(
                                "task {task_id} still conflicted after {attempt} attempts"
                            ),
                            retries,
                        )
                        .with_cause(&err));
                    }

                    let delay = backoff_delay(self.base_backoff, attempt);
                    debug!(%task_id, attempt, ?delay, "conflict on save; backing off");
                    let interrupted = tokio::select! {
                        biased;
                        () = cancel.cancelled() => true,
                        () = tokio::time::sleep(delay) => cancel.is_cancelled(),
                    };
                    if interrupted {
                        return Err(UpdateFailure::new(
                            BatchErrorKind::Interrupted,
                            format!("task {task_id} retry interrupted after {attempt} attempts"),
                            retries,
                        )
                        .with_cause(&err));
                    }
                    counters.record_retry();
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
