//! Progress sinks shipped with the crate.

use crate::batch::{domain::ProgressSnapshot, ports::ProgressSink};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Buffers every snapshot in arrival order.
#[derive(Debug, Default)]
pub struct RecordingProgressSink {
    snapshots: Mutex<Vec<ProgressSnapshot>>,
}

impl RecordingProgressSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded snapshots.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the most recently recorded snapshot.
    ///
    /// Batches report side by side, so with more than one batch the last
    /// arrival may carry a lower processed count than an earlier one. Use
    /// [`RecordingProgressSink::furthest`] for the most advanced snapshot.
    #[must_use]
    pub fn last(&self) -> Option<ProgressSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Returns the snapshot with the highest processed count, preferring the
    /// later arrival on ties.
    #[must_use]
    pub fn furthest(&self) -> Option<ProgressSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .max_by_key(|snapshot| snapshot.processed_tasks)
            .cloned()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn report(&self, snapshot: &ProgressSnapshot) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}

/// Streams snapshots as `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn report(&self, snapshot: &ProgressSnapshot) {
        debug!(
            total = snapshot.total_tasks,
            processed = snapshot.processed_tasks,
            succeeded = snapshot.successful_tasks,
            failed = snapshot.failed_tasks,
            task_id = ?snapshot.current_task_id,
            "{}",
            snapshot.description
        );
    }
}
