//! Per-task failure records and request validation errors.

use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a per-task failure inside a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchErrorKind {
    /// The task does not exist. Never retried.
    NotFound,
    /// The target status is not reachable from the current status. Never
    /// retried.
    RuleViolation,
    /// Optimistic-concurrency conflicts outlasted the retry budget.
    ConcurrencyConflict,
    /// A retry backoff was cut short by cancellation.
    Interrupted,
    /// The repository failed for a reason other than a conflict.
    Persistence,
    /// A whole batch unit failed outside per-task handling.
    BatchUnitFailure,
}

impl BatchErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RuleViolation => "rule_violation",
            Self::ConcurrencyConflict => "concurrency_conflict",
            Self::Interrupted => "interrupted",
            Self::Persistence => "persistence",
            Self::BatchUnitFailure => "batch_unit_failure",
        }
    }
}

/// One failed entry in a batch result.
///
/// Entries produced for a failed batch unit carry no task identifier; they
/// are tagged with the index of the batch instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOperationError {
    task_id: Option<TaskId>,
    batch_index: Option<usize>,
    message: String,
    kind: BatchErrorKind,
    cause: Option<String>,
    occurred_at: DateTime<Utc>,
    retry_attempts: u32,
}

impl BatchOperationError {
    /// Creates an error for a single task.
    #[must_use]
    pub fn for_task(
        task_id: TaskId,
        kind: BatchErrorKind,
        message: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: Some(task_id),
            batch_index: None,
            message: message.into(),
            kind,
            cause: None,
            occurred_at,
            retry_attempts: 0,
        }
    }

    /// Creates the synthetic entry standing in for a failed batch unit.
    #[must_use]
    pub fn batch_unit_failure(
        batch_index: usize,
        message: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: None,
            batch_index: Some(batch_index),
            message: message.into(),
            kind: BatchErrorKind::BatchUnitFailure,
            cause: None,
            occurred_at,
            retry_attempts: 0,
        }
    }

    /// Attaches the originating failure detail.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Sets the number of retries consumed before giving up.
    #[must_use]
    pub const fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// Returns the failed task, if the entry is task-scoped.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the failed batch index for batch-unit entries.
    #[must_use]
    pub const fn batch_index(&self) -> Option<usize> {
        self.batch_index
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the failure classification.
    #[must_use]
    pub const fn kind(&self) -> BatchErrorKind {
        self.kind
    }

    /// Returns the originating failure detail, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Returns when the failure was recorded.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns the number of retries consumed.
    #[must_use]
    pub const fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Returns `true` for conflict and interrupted-backoff failures.
    #[must_use]
    pub const fn is_concurrency_error(&self) -> bool {
        matches!(
            self.kind,
            BatchErrorKind::ConcurrencyConflict | BatchErrorKind::Interrupted
        )
    }

    /// Returns `true` when the transition rule rejected the change.
    #[must_use]
    pub const fn is_business_rule_violation(&self) -> bool {
        matches!(self.kind, BatchErrorKind::RuleViolation)
    }

    /// Returns `true` when the task kept conflicting until `max_retries`
    /// retries were spent.
    #[must_use]
    pub const fn failed_after_retries(&self, max_retries: u32) -> bool {
        matches!(self.kind, BatchErrorKind::ConcurrencyConflict)
            && self.retry_attempts >= max_retries
    }
}

/// Errors raised while building a [`super::BatchUpdateRequest`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchRequestError {
    /// No task identifiers were supplied.
    #[error("batch update requires at least one task id")]
    EmptyTaskIds,

    /// The target status was not set.
    #[error("batch update requires a target status")]
    MissingTargetStatus,

    /// The acting user is missing or blank.
    #[error("batch update requires a non-blank acting user")]
    BlankActor,

    /// The batch size is not positive.
    #[error("invalid batch size {0}, expected a positive integer")]
    InvalidBatchSize(usize),
}
