//! Fixed-size pool of long-lived tokio workers pulling batch units from a
//! shared queue.

use futures::future::{BoxFuture, join_all};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One batch's worth of work, ready to run on a pool worker.
pub type BatchUnit = BoxFuture<'static, ()>;

type UnitQueue = Arc<AsyncMutex<mpsc::UnboundedReceiver<BatchUnit>>>;

/// Returned by [`WorkerPool::submit`] once the pool has been shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("worker pool is shut down")]
pub struct PoolClosed;

/// How [`WorkerPool::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every worker finished within the grace period.
    Graceful,
    /// The grace period elapsed and the remaining workers were aborted.
    Forced {
        /// Number of workers aborted.
        aborted: usize,
    },
}

/// Bounded set of workers executing [`BatchUnit`]s.
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::UnboundedSender<BatchUnit>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: NonZeroUsize,
}

impl WorkerPool {
    /// Spawns `size` workers on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn spawn(size: NonZeroUsize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: UnitQueue = Arc::new(AsyncMutex::new(receiver));
        let workers = (0..size.get())
            .map(|worker_id| tokio::spawn(worker_loop(worker_id, Arc::clone(&queue))))
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            size,
        }
    }

    /// Returns the number of workers.
    #[must_use]
    pub const fn size(&self) -> NonZeroUsize {
        self.size
    }

    /// Returns `true` once [`WorkerPool::shutdown`] has started.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Queues a unit for the next idle worker.
    ///
    /// # Errors
    ///
    /// Returns [`PoolClosed`] after shutdown.
    pub fn submit(&self, unit: BatchUnit) -> Result<(), PoolClosed> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(PoolClosed)?;
        sender.send(unit).map_err(|_| PoolClosed)
    }

    /// Stops accepting units and waits up to `grace` for queued and running
    /// units to finish before aborting the workers.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownOutcome {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let mut workers =
            std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));

        let joined = tokio::time::timeout(grace, join_all(workers.iter_mut())).await;
        match joined {
            Ok(joined) => {
                for failure in joined.into_iter().filter_map(Result::err) {
                    warn!(error = %failure, "pool worker ended abnormally");
                }
                ShutdownOutcome::Graceful
            }
            Err(_) => {
                let aborted = workers.iter().filter(|worker| !worker.is_finished()).count();
                for worker in &workers {
                    worker.abort();
                }
                warn!(aborted, ?grace, "pool shutdown grace elapsed; aborting workers");
                ShutdownOutcome::Forced { aborted }
            }
        }
    }
}

async fn worker_loop(worker_id: usize, queue: UnitQueue) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(unit) = next else {
            break;
        };
        unit.await;
    }
    debug!(worker_id, "pool worker stopped");
}
