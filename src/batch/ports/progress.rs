//! Progress sink capability supplied by callers of a batch run.

use crate::batch::domain::ProgressSnapshot;

/// Receives progress snapshots while a batch run is in flight.
///
/// Many batches report at once, so implementations must tolerate concurrent
/// calls. Snapshots may arrive out of order. A panicking sink is isolated
/// from the run.
pub trait ProgressSink: Send + Sync {
    /// Handles one snapshot.
    fn report(&self, snapshot: &ProgressSnapshot);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressSnapshot) + Send + Sync,
{
    fn report(&self, snapshot: &ProgressSnapshot) {
        self(snapshot);
    }
}
