//! Shared fixtures for in-memory batch integration tests.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use tasklane::batch::{
    domain::{BatchErrorKind, BatchOperationResult},
    services::{BatchEngineConfig, BatchStatusUpdateEngine},
};
use tasklane::task::domain::TaskId;

use crate::test_helpers::FlakyTaskRepository;

/// Engine type used across the in-memory suites.
pub type TestEngine = BatchStatusUpdateEngine<FlakyTaskRepository, DefaultClock>;

/// Provides a fresh repository for each test.
#[fixture]
pub fn repository() -> Arc<FlakyTaskRepository> {
    Arc::new(FlakyTaskRepository::new())
}

/// Engine configuration with a short backoff and a fixed pool.
pub fn fast_config() -> BatchEngineConfig {
    BatchEngineConfig::default()
        .with_base_backoff(Duration::from_millis(1))
        .with_pool_size(NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN))
}

/// Builds an engine over `repository` with [`fast_config`].
pub fn engine_for(repository: &Arc<FlakyTaskRepository>) -> TestEngine {
    engine_with(repository, fast_config())
}

/// Builds an engine over `repository` with an explicit configuration.
pub fn engine_with(repository: &Arc<FlakyTaskRepository>, config: BatchEngineConfig) -> TestEngine {
    BatchStatusUpdateEngine::with_config(Arc::clone(repository), Arc::new(DefaultClock), config)
}

/// Returns the ids of the successfully updated tasks, sorted.
pub fn successful_ids(result: &BatchOperationResult) -> Vec<TaskId> {
    let mut ids: Vec<TaskId> = result.successful_tasks().iter().map(|task| task.id).collect();
    ids.sort();
    ids
}

/// Returns `(task id, kind)` for every per-task error, sorted.
pub fn error_pairs(result: &BatchOperationResult) -> Vec<(Option<TaskId>, BatchErrorKind)> {
    let mut pairs: Vec<_> = result
        .errors()
        .iter()
        .map(|error| (error.task_id(), error.kind()))
        .collect();
    pairs.sort_by_key(|(id, kind)| (*id, kind.as_str()));
    pairs
}

/// Asserts the accounting identities every finished run satisfies.
pub fn assert_accounting(result: &BatchOperationResult, expected_total: usize) {
    assert_eq!(result.total_count(), expected_total);
    assert_eq!(
        result.success_count() + result.failure_count(),
        result.total_count()
    );
    assert_eq!(result.success_count(), result.successful_tasks().len());
}
