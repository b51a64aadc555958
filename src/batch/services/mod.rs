//! Services running batch status updates.
//!
//! Leaves first: [`partition`] splits ids into batches,
//! [`RetryingTaskUpdater`] changes one task, [`BatchWorker`] walks one
//! batch, [`ProgressReporter`] forwards snapshots, [`ResultAggregator`]
//! builds the report, and [`BatchStatusUpdateEngine`] coordinates them on a
//! [`WorkerPool`].

mod aggregator;
mod config;
mod counters;
mod engine;
mod partition;
mod pool;
mod reporter;
mod updater;
mod worker;

pub use aggregator::ResultAggregator;
pub use config::BatchEngineConfig;
pub use counters::{CounterSnapshot, RunCounters};
pub use engine::{BatchEngineError, BatchEngineResult, BatchStatusUpdateEngine};
pub use partition::partition;
pub use pool::{BatchUnit, PoolClosed, ShutdownOutcome, WorkerPool};
pub use reporter::ProgressReporter;
pub use updater::{
    AttemptOutcome, RetryingTaskUpdater, StatusChangeCommand, UpdateFailure, UpdatedTask,
    backoff_delay,
};
pub use worker::{BatchOutcome, BatchWorker, RunContext};
