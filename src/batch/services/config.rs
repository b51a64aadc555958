//! Tuning knobs for the batch status-update engine.

use std::num::NonZeroUsize;
use std::time::Duration;

/// Engine configuration.
///
/// The defaults bound the pool at `min(2 × available_parallelism, 10)`
/// workers, give a run five minutes, give shutdown thirty seconds, and start
/// conflict backoff at 100 ms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEngineConfig {
    /// Upper bound on the computed pool size.
    pub max_pool_size: usize,
    /// Workers per unit of available parallelism.
    pub workers_per_core: usize,
    /// Fixed pool size overriding the computed one.
    pub pool_size_override: Option<NonZeroUsize>,
    /// Ceiling on one run, measured from dispatch.
    pub global_timeout: Duration,
    /// Time cancelled batches get to wind down after a timeout.
    pub cancellation_grace: Duration,
    /// Time in-flight work gets to finish on shutdown.
    pub shutdown_grace: Duration,
    /// Delay before the first conflict retry. Doubles on each retry.
    pub base_backoff: Duration,
}

impl Default for BatchEngineConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            workers_per_core: 2,
            pool_size_override: None,
            global_timeout: Duration::from_secs(5 * 60),
            cancellation_grace: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(30),
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl BatchEngineConfig {
    /// Pins the pool to exactly `size` workers.
    #[must_use]
    pub const fn with_pool_size(mut self, size: NonZeroUsize) -> Self {
        self.pool_size_override = Some(size);
        self
    }

    /// Sets the run ceiling.
    #[must_use]
    pub const fn with_global_timeout(mut self, timeout: Duration) -> Self {
        self.global_timeout = timeout;
        self
    }

    /// Sets the wind-down window for cancelled batches.
    #[must_use]
    pub const fn with_cancellation_grace(mut self, grace: Duration) -> Self {
        self.cancellation_grace = grace;
        self
    }

    /// Sets the shutdown window.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Sets the first retry delay.
    #[must_use]
    pub const fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// Returns the number of pool workers for this host.
    #[must_use]
    pub fn pool_size(&self) -> NonZeroUsize {
        if let Some(size) = self.pool_size_override {
            return size;
        }
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let computed = cores
            .saturating_mul(self.workers_per_core)
            .min(self.max_pool_size);
        NonZeroUsize::new(computed).unwrap_or(NonZeroUsize::MIN)
    }
}
