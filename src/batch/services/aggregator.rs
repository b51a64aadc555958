//! Merges batch outcomes into the final run report.

use super::BatchOutcome;
use crate::batch::domain::{BatchOperationError, BatchOperationResult, metric, percentage};
use crate::task::domain::TaskSummary;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Collects batch outcomes for one run.
///
/// The failure count is derived as `total - successes`, so a batch replaced
/// by a single synthetic error still accounts for all of its tasks.
#[derive(Debug)]
pub struct ResultAggregator {
    total_count: usize,
    pool_size: usize,
    started_at: DateTime<Utc>,
    successful_tasks: Vec<TaskSummary>,
    errors: Vec<BatchOperationError>,
}

impl ResultAggregator {
    /// Starts aggregating a run of `total_count` tasks.
    #[must_use]
    pub const fn new(total_count: usize, pool_size: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            total_count,
            pool_size,
            started_at,
            successful_tasks: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Appends the contribution of one batch, keeping its internal order.
    pub fn absorb(&mut self, outcome: BatchOutcome) {
        self.successful_tasks.extend(outcome.successful);
        self.errors.extend(outcome.errors);
    }

    /// Appends a standalone error, such as a failed batch unit.
    pub fn absorb_error(&mut self, error: BatchOperationError) {
        self.errors.push(error);
    }

    /// Produces the immutable result.
    #[must_use]
    pub fn finish(self, retry_count: usize, ended_at: DateTime<Utc>) -> BatchOperationResult {
        let success_count = self.successful_tasks.len();
        let failure_count = self.total_count.saturating_sub(success_count);
        let elapsed_ms = (ended_at - self.started_at).num_milliseconds().max(0);
        let metrics = performance_metrics(
            elapsed_ms,
            self.total_count,
            retry_count,
            self.pool_size,
        );

        BatchOperationResult {
            total_count: self.total_count,
            success_count,
            failure_count,
            retry_count,
            successful_tasks: self.successful_tasks,
            errors: self.errors,
            started_at: self.started_at,
            ended_at,
            metrics,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "metrics are reporting values; counts and milliseconds stay far below 2^52"
)]
fn performance_metrics(
    elapsed_ms: i64,
    total_count: usize,
    retry_count: usize,
    pool_size: usize,
) -> BTreeMap<String, f64> {
    let elapsed = elapsed_ms as f64;
    let total = total_count as f64;
    let average = if total_count == 0 { 0.0 } else { elapsed / total };
    let throughput = if elapsed_ms == 0 {
        0.0
    } else {
        total / (elapsed / 1_000.0)
    };

    BTreeMap::from([
        (metric::EXECUTION_TIME_MS.to_owned(), elapsed),
        (metric::AVERAGE_TIME_PER_TASK_MS.to_owned(), average),
        (metric::THROUGHPUT_PER_SECOND.to_owned(), throughput),
        (
            metric::RETRY_RATE_PERCENT.to_owned(),
            percentage(retry_count, total_count),
        ),
        (metric::POOL_SIZE.to_owned(), pool_size as f64),
    ])
}
