//! Best-effort delivery of progress snapshots to a caller's sink.

use super::RunCounters;
use crate::batch::{domain::ProgressSnapshot, ports::ProgressSink};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Forwards snapshots to an optional [`ProgressSink`].
///
/// Reporters share the engine's gate: deliveries hold it for reading, so
/// batches report side by side, while the counter reset before a run holds
/// it for writing.
#[derive(Clone)]
pub struct ProgressReporter {
    gate: Arc<RwLock<()>>,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressReporter {
    /// Creates a reporter over the engine's gate.
    #[must_use]
    pub const fn new(gate: Arc<RwLock<()>>, sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self { gate, sink }
    }

    /// Returns `true` when a sink is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Zeroes `counters` while no snapshot is being delivered.
    pub fn reset_counters(&self, counters: &RunCounters) {
        let _exclusive = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        counters.reset();
    }

    /// Delivers `snapshot` to the sink, swallowing sink panics.
    pub fn report(&self, snapshot: &ProgressSnapshot) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        let _shared = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        if catch_unwind(AssertUnwindSafe(|| sink.report(snapshot))).is_err() {
            warn!(
                processed = snapshot.processed_tasks,
                total = snapshot.total_tasks,
                "progress sink panicked; snapshot dropped"
            );
        }
    }
}
