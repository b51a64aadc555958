//! Concurrent batch status-update engine.
//!
//! A run partitions the request, hands every batch to the engine's
//! [`WorkerPool`] with a oneshot completion signal, and joins the signals
//! under one deadline. Per-task failures come back inside the
//! [`BatchOperationResult`]; only whole-run conditions are returned as
//! [`BatchEngineError`].

use super::{
    BatchEngineConfig, BatchOutcome, BatchWorker, ProgressReporter, ResultAggregator,
    RetryingTaskUpdater, RunContext, RunCounters, ShutdownOutcome, StatusChangeCommand,
    WorkerPool, partition,
};
use crate::batch::domain::{BatchOperationError, BatchOperationResult, BatchUpdateRequest};
use crate::task::{domain::TaskId, ports::TaskRepository};
use futures::{FutureExt, StreamExt, stream::FuturesUnordered};
use mockable::Clock;
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Whole-run failures of [`BatchStatusUpdateEngine::execute`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchEngineError {
    /// The run did not finish before the global deadline. Outstanding
    /// batches were cancelled and no result is available.
    #[error("batch run exceeded {timeout:?} with {processed} of {total} tasks processed")]
    GlobalTimeout {
        /// Configured ceiling.
        timeout: Duration,
        /// Tasks processed when the deadline fired.
        processed: usize,
        /// Tasks in the run.
        total: usize,
    },

    /// The engine's pool has been shut down.
    #[error("batch engine has been shut down")]
    ShutDown,
}

/// Result type for engine runs.
pub type BatchEngineResult<T> = Result<T, BatchEngineError>;

type UnitResult = Result<BatchOutcome, String>;

/// Applies one target status to many tasks in parallel.
///
/// The pool is created with the engine and reused by every run; call
/// [`BatchStatusUpdateEngine::shutdown`] once the engine is no longer
/// needed. Runs on one engine are serialised because the counters they
/// report are engine-scoped.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mockable::DefaultClock;
/// use tasklane::batch::{domain::BatchUpdateRequest, services::BatchStatusUpdateEngine};
/// use tasklane::task::{
///     adapters::memory::InMemoryTaskRepository,
///     domain::{Task, TaskStatus, TaskTitle},
///     ports::TaskRepository,
/// };
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let repository = Arc::new(InMemoryTaskRepository::new());
/// let task = Task::new(TaskTitle::new("Write changelog").expect("title"), &DefaultClock);
/// repository.store(&task).await.expect("store");
///
/// let engine = BatchStatusUpdateEngine::new(repository, Arc::new(DefaultClock));
/// let request = BatchUpdateRequest::builder()
///     .task_ids([task.id()])
///     .target_status(TaskStatus::InProgress)
///     .requested_by("alice")
///     .build()
///     .expect("valid request");
///
/// let result = engine.execute(request).await.expect("run completes");
/// assert!(result.is_completely_successful());
/// engine.shutdown().await;
/// # });
/// ```
pub struct BatchStatusUpdateEngine<R, C>
where
    R: TaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    clock: Arc<C>,
    config: BatchEngineConfig,
    pool: WorkerPool,
    counters: Arc<RunCounters>,
    progress_gate: Arc<RwLock<()>>,
    run_lock: AsyncMutex<()>,
}

impl<R, C> BatchStatusUpdateEngine<R, C>
where
    R: TaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an engine with default configuration.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_config(repository, clock, BatchEngineConfig::default())
    }

    /// Creates an engine with custom configuration.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn with_config(repository: Arc<R>, clock: Arc<C>, config: BatchEngineConfig) -> Self {
        let pool = WorkerPool::spawn(config.pool_size());
        info!(pool_size = pool.size().get(), "batch engine started");
        Self {
            repository,
            clock,
            config,
            pool,
            counters: Arc::new(RunCounters::new()),
            progress_gate: Arc::new(RwLock::new(())),
            run_lock: AsyncMutex::new(()),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &BatchEngineConfig {
        &self.config
    }

    /// Returns the number of pool workers.
    #[must_use]
    pub const fn pool_size(&self) -> NonZeroUsize {
        self.pool.size()
    }

    /// Moves every requested task to the target status.
    ///
    /// # Errors
    ///
    /// Returns [`BatchEngineError::GlobalTimeout`] when the run outlasts the
    /// configured ceiling and [`BatchEngineError::ShutDown`] after
    /// [`BatchStatusUpdateEngine::shutdown`].
    pub async fn execute(
        &self,
        request: BatchUpdateRequest,
    ) -> BatchEngineResult<BatchOperationResult> {
        let _exclusive_run = self.run_lock.lock().await;
        if self.pool.is_closed() {
            return Err(BatchEngineError::ShutDown);
        }

        let total = request.task_ids().len();
        let reporter = ProgressReporter::new(
            Arc::clone(&self.progress_gate),
            request.progress_sink().cloned(),
        );
        reporter.reset_counters(&self.counters);

        let started_at = self.clock.utc();
        let batches = partition(request.task_ids(), request.batch_size());
        info!(
            total,
            batches = batches.len(),
            target = request.target_status().as_str(),
            requested_by = request.requested_by(),
            "starting batch status update"
        );

        let cancel = CancellationToken::new();
        let _cancel_on_exit = cancel.clone().drop_guard();
        let context = Arc::new(RunContext {
            updater: RetryingTaskUpdater::new(
                Arc::clone(&self.repository),
                Arc::clone(&self.clock),
                self.config.base_backoff,
            ),
            command: StatusChangeCommand::from(&request),
            counters: Arc::clone(&self.counters),
            reporter,
            clock: Arc::clone(&self.clock),
            total_tasks: total,
            cancel: cancel.clone(),
        });

        let mut pending = FuturesUnordered::new();
        for (batch_index, task_ids) in batches.into_iter().enumerate() {
            let receiver = self.dispatch(Arc::clone(&context), batch_index, task_ids)?;
            pending.push(async move { (batch_index, receiver.await) });
        }

        let mut aggregator = ResultAggregator::new(total, self.pool.size().get(), started_at);
        let deadline = tokio::time::sleep(self.config.global_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                next = pending.next() => {
                    let Some((batch_index, received)) = next else {
                        break;
                    };
                    match received {
                        Ok(Ok(outcome)) => aggregator.absorb(outcome),
                        Ok(Err(reason)) => aggregator.absorb_error(self.unit_failure(batch_index, &reason)),
                        Err(_) => aggregator.absorb_error(
                            self.unit_failure(batch_index, "batch unit was dropped before completing"),
                        ),
                    }
                }
                () = &mut deadline => {
                    let counts = self.counters.snapshot();
                    cancel.cancel();
                    warn!(
                        timeout = ?self.config.global_timeout,
                        processed = counts.processed,
                        total,
                        unfinished_batches = pending.len(),
                        "batch run timed out; cancelling outstanding batches"
                    );
                    let drain = pending.collect::<Vec<_>>();
                    if tokio::time::timeout(self.config.cancellation_grace, drain).await.is_err() {
                        warn!("cancelled batches still running after the grace period");
                    }
                    return Err(BatchEngineError::GlobalTimeout {
                        timeout: self.config.global_timeout,
                        processed: counts.processed,
                        total,
                    });
                }
            }
        }

        let counts = self.counters.snapshot();
        let result = aggregator.finish(counts.retried, self.clock.utc());
        info!(
            total,
            succeeded = result.success_count(),
            failed = result.failure_count(),
            retries = result.retry_count(),
            elapsed_ms = result.execution_time().num_milliseconds(),
            "batch status update finished"
        );
        Ok(result)
    }

    /// Releases the pool, waiting up to the configured grace period for
    /// in-flight batches before aborting them.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        let outcome = self.pool.shutdown(self.config.shutdown_grace).await;
        info!(?outcome, "batch engine stopped");
        outcome
    }

    fn dispatch(
        &self,
        context: Arc<RunContext<R, C>>,
        batch_index: usize,
        task_ids: Vec<TaskId>,
    ) -> BatchEngineResult<oneshot::Receiver<UnitResult>> {
        let (done, receiver) = oneshot::channel::<UnitResult>();
        let unit = async move {
            let worker = BatchWorker::new(context);
            let result = AssertUnwindSafe(worker.run(batch_index, &task_ids))
                .catch_unwind()
                .await
                .map_err(|payload| panic_message(payload.as_ref()));
            if done.send(result).is_err() {
                debug!(batch_index, "run stopped waiting for batch");
            }
        }
        .boxed();

        self.pool
            .submit(unit)
            .map_err(|_| BatchEngineError::ShutDown)?;
        Ok(receiver)
    }

    fn unit_failure(&self, batch_index: usize, reason: &str) -> BatchOperationError {
        warn!(batch_index, reason, "batch unit failed");
        BatchOperationError::batch_unit_failure(
            batch_index,
            format!("batch {batch_index} failed: {reason}"),
            self.clock.utc(),
        )
        .with_cause(reason)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "batch unit panicked".to_owned())
}
