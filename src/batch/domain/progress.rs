//! Point-in-time progress snapshots emitted during a batch run.

use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of how much of a run has completed.
///
/// Counts are read from run-wide counters, so a snapshot emitted by one
/// batch reflects work done by every batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Number of tasks in the run.
    pub total_tasks: usize,
    /// Number of tasks that reached a terminal outcome.
    pub processed_tasks: usize,
    /// Number of tasks updated successfully.
    pub successful_tasks: usize,
    /// Number of tasks that failed.
    pub failed_tasks: usize,
    /// Task handled just before this snapshot.
    pub current_task_id: Option<TaskId>,
    /// Description of the step just handled.
    pub description: String,
    /// When the snapshot was taken.
    pub recorded_at: DateTime<Utc>,
}

impl ProgressSnapshot {
    /// Returns `true` once every task has been processed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.processed_tasks >= self.total_tasks
    }

    /// Returns the processed share as a percentage in `0.0..=100.0`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "percentages are reporting values; task counts stay far below 2^52"
    )]
    pub fn percent_complete(&self) -> f64 {
        if self.total_tasks == 0 {
            return 100.0;
        }
        let ratio = self.processed_tasks as f64 / self.total_tasks as f64;
        (ratio * 100.0).min(100.0)
    }
}
