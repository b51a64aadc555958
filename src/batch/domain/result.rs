//! Final report of a batch status-update run.

use super::BatchOperationError;
use crate::task::domain::TaskSummary;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Names of the performance metrics recorded on every result.
pub mod metric {
    /// Wall-clock duration of the run in milliseconds.
    pub const EXECUTION_TIME_MS: &str = "execution_time_ms";
    /// Wall-clock milliseconds per task.
    pub const AVERAGE_TIME_PER_TASK_MS: &str = "average_time_per_task_ms";
    /// Tasks handled per second of wall-clock time.
    pub const THROUGHPUT_PER_SECOND: &str = "throughput_per_second";
    /// Retries per hundred tasks.
    pub const RETRY_RATE_PERCENT: &str = "retry_rate_percent";
    /// Number of workers in the engine's pool.
    pub const POOL_SIZE: &str = "pool_size";
}

/// Outcome of one [`super::BatchUpdateRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOperationResult {
    pub(crate) total_count: usize,
    pub(crate) success_count: usize,
    pub(crate) failure_count: usize,
    pub(crate) retry_count: usize,
    pub(crate) successful_tasks: Vec<TaskSummary>,
    pub(crate) errors: Vec<BatchOperationError>,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) ended_at: DateTime<Utc>,
    pub(crate) metrics: BTreeMap<String, f64>,
}

impl BatchOperationResult {
    /// Returns the number of distinct tasks in the request.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.total_count
    }

    /// Returns the number of tasks updated.
    #[must_use]
    pub const fn success_count(&self) -> usize {
        self.success_count
    }

    /// Returns the number of tasks not updated.
    #[must_use]
    pub const fn failure_count(&self) -> usize {
        self.failure_count
    }

    /// Returns the number of conflict retries performed across the run.
    #[must_use]
    pub const fn retry_count(&self) -> usize {
        self.retry_count
    }

    /// Returns the updated tasks. Order is kept within a batch only.
    #[must_use]
    pub fn successful_tasks(&self) -> &[TaskSummary] {
        &self.successful_tasks
    }

    /// Returns the failures. Order is kept within a batch only.
    #[must_use]
    pub fn errors(&self) -> &[BatchOperationError] {
        &self.errors
    }

    /// Returns when the run started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when the run finished.
    #[must_use]
    pub const fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    /// Returns the wall-clock duration of the run.
    #[must_use]
    pub fn execution_time(&self) -> TimeDelta {
        self.ended_at - self.started_at
    }

    /// Returns every recorded metric keyed by name. See [`metric`].
    #[must_use]
    pub const fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    /// Returns one metric by name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Returns successes per hundred tasks, or zero for an empty run.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        percentage(self.success_count, self.total_count)
    }

    /// Returns failures per hundred tasks, or zero for an empty run.
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        percentage(self.failure_count, self.total_count)
    }

    /// Returns `true` when at least one error was recorded.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` when every task was updated.
    #[must_use]
    pub const fn is_completely_successful(&self) -> bool {
        self.failure_count == 0 && self.success_count == self.total_count
    }
}

/// Returns `part / whole × 100`, or zero when `whole` is zero.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "rates are reporting values; task counts stay far below 2^52"
)]
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
