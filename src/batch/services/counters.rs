//! Run-scoped counters shared by every batch worker.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Processed, succeeded, failed and retried counts for one run.
///
/// The counters are reset on one thread before any batch is dispatched and
/// only incremented afterwards; plain atomic increments are sufficient.
#[derive(Debug, Default)]
pub struct RunCounters {
    processed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
}

/// Values read from [`RunCounters`] at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Tasks that reached a terminal outcome.
    pub processed: usize,
    /// Tasks updated.
    pub succeeded: usize,
    /// Tasks that failed.
    pub failed: usize,
    /// Conflict retries performed.
    pub retried: usize,
}

impl RunCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        self.processed.store(0, Ordering::SeqCst);
        self.succeeded.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.retried.store(0, Ordering::SeqCst);
    }

    /// Records one updated task.
    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one failed task.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one conflict retry.
    pub fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
        }
    }
}
