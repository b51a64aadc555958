//! Batch runs under injected conflicts, panics, latency, and shutdown.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use tasklane::batch::{
    adapters::RecordingProgressSink,
    domain::{BatchErrorKind, BatchUpdateRequest, ProgressSnapshot},
    ports::ProgressSink,
    services::{BatchEngineError, ShutdownOutcome},
};
use tasklane::task::{
    domain::{TaskId, TaskStatus},
    ports::TaskRepository,
};

use crate::in_memory::helpers::{assert_accounting, engine_for, engine_with, fast_config, repository};
use crate::test_helpers::FlakyTaskRepository;

fn request(ids: &[TaskId], batch_size: usize, max_retries: u32) -> BatchUpdateRequest {
    BatchUpdateRequest::builder()
        .task_ids(ids.iter().copied())
        .target_status(TaskStatus::InProgress)
        .requested_by("release-bot")
        .batch_size(batch_size)
        .max_retries(max_retries)
        .build()
        .expect("valid request")
}

struct PanickingSink;

impl ProgressSink for PanickingSink {
    fn report(&self, _snapshot: &ProgressSnapshot) {
        panic!("progress consumer failed");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conflict_within_budget_is_retried(repository: Arc<FlakyTaskRepository>) {
    let ids = repository.seed(1, TaskStatus::Todo).await;
    let id = *ids.first().expect("seeded id");
    repository.conflict_times(id, 1);
    let engine = engine_for(&repository);

    let result = engine
        .execute(request(&ids, 10, 2))
        .await
        .expect("run should finish");

    assert_accounting(&result, 1);
    assert_eq!(result.success_count(), 1);
    assert!(result.retry_count() >= 1);
    let stored = repository
        .find_by_id(id)
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::InProgress);
}

#[rstest]
#[case::exactly_at_budget(3, 3)]
#[case::under_budget(2, 5)]
#[tokio::test(flavor = "multi_thread")]
async fn retry_count_matches_injected_conflicts(
    repository: Arc<FlakyTaskRepository>,
    #[case] conflicts: u32,
    #[case] max_retries: u32,
) {
    let ids = repository.seed(1, TaskStatus::Todo).await;
    repository.conflict_times(*ids.first().expect("seeded id"), conflicts);
    let engine = engine_for(&repository);

    let result = engine
        .execute(request(&ids, 10, max_retries))
        .await
        .expect("run should finish");

    assert!(result.is_completely_successful());
    assert_eq!(result.retry_count(), usize::try_from(conflicts).expect("small count"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conflicts_beyond_budget_are_reported(repository: Arc<FlakyTaskRepository>) {
    let ids = repository.seed(2, TaskStatus::Todo).await;
    let stubborn = *ids.first().expect("seeded id");
    repository.conflict_times(stubborn, 10);
    let engine = engine_for(&repository);

    let result = engine
        .execute(request(&ids, 10, 2))
        .await
        .expect("run should finish");

    assert_accounting(&result, 2);
    assert_eq!(result.success_count(), 1);
    let error = result.errors().first().expect("one error");
    assert_eq!(error.task_id(), Some(stubborn));
    assert_eq!(error.kind(), BatchErrorKind::ConcurrencyConflict);
    assert!(error.is_concurrency_error());
    assert!(error.failed_after_retries(2));
    assert_eq!(error.retry_attempts(), 2);
    assert_eq!(result.retry_count(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conflict_without_retry_budget_is_exhausted(repository: Arc<FlakyTaskRepository>) {
    let ids = repository.seed(1, TaskStatus::Todo).await;
    repository.conflict_times(*ids.first().expect("seeded id"), 5);
    let engine = engine_for(&repository);

    let result = engine
        .execute(request(&ids, 10, 0))
        .await
        .expect("run should finish");

    let error = result.errors().first().expect("one error");
    assert_eq!(error.kind(), BatchErrorKind::ConcurrencyConflict);
    assert_eq!(error.retry_attempts(), 0);
    assert!(error.failed_after_retries(0));
    assert_eq!(result.retry_count(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn panicking_unit_becomes_a_batch_failure(repository: Arc<FlakyTaskRepository>) {
    let ids = repository.seed(5, TaskStatus::Todo).await;
    let poisoned = *ids.get(2).expect("seeded id");
    repository.panic_on_find(poisoned);
    let engine = engine_for(&repository);

    let result = engine
        .execute(request(&ids, 2, 0))
        .await
        .expect("run should finish");

    assert_accounting(&result, 5);
    assert_eq!(result.success_count(), 3);
    assert_eq!(result.failure_count(), 2);
    let failure = result.errors().first().expect("unit failure");
    assert_eq!(failure.kind(), BatchErrorKind::BatchUnitFailure);
    assert_eq!(failure.batch_index(), Some(1));
    assert_eq!(failure.task_id(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn panicking_progress_sink_does_not_break_the_run(repository: Arc<FlakyTaskRepository>) {
    let ids = repository.seed(4, TaskStatus::Todo).await;
    let engine = engine_for(&repository);
    let request = BatchUpdateRequest::builder()
        .task_ids(ids)
        .target_status(TaskStatus::InProgress)
        .requested_by("release-bot")
        .batch_size(2)
        .progress_sink(Arc::new(PanickingSink))
        .build()
        .expect("valid request");

    let result = engine.execute(request).await.expect("run should finish");

    assert_accounting(&result, 4);
    assert!(result.is_completely_successful());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_run_hits_the_global_timeout(repository: Arc<FlakyTaskRepository>) {
    let slow = repository.seed(10, TaskStatus::Todo).await;
    let quick = repository.seed(1, TaskStatus::Todo).await;
    repository.delay_finds(Duration::from_millis(50));
    let config = fast_config()
        .with_pool_size(NonZeroUsize::MIN)
        .with_global_timeout(Duration::from_millis(150));
    let engine = engine_with(&repository, config);

    let outcome = engine.execute(request(&slow, 10, 0)).await;

    match outcome {
        Err(BatchEngineError::GlobalTimeout {
            timeout,
            processed,
            total,
        }) => {
            assert_eq!(timeout, Duration::from_millis(150));
            assert_eq!(total, 10);
            assert!(processed < total);
        }
        other => panic!("expected a global timeout, got {other:?}"),
    }

    let result = engine
        .execute(request(&quick, 10, 0))
        .await
        .expect("engine should accept another run");
    assert_accounting(&result, 1);
    assert!(result.is_completely_successful());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn late_work_from_a_timed_out_run_does_not_leak_into_the_next(
    repository: Arc<FlakyTaskRepository>,
) {
    let slow = repository.seed(2, TaskStatus::Todo).await;
    let next = repository.seed(1, TaskStatus::Todo).await;
    repository.delay_finds(Duration::from_millis(300));
    let config = fast_config()
        .with_pool_size(NonZeroUsize::new(2).unwrap_or(NonZeroUsize::MIN))
        .with_global_timeout(Duration::from_millis(400))
        .with_cancellation_grace(Duration::from_millis(10));
    let engine = engine_with(&repository, config);

    let timed_out = engine.execute(request(&slow, 10, 0)).await;
    assert!(matches!(
        timed_out,
        Err(BatchEngineError::GlobalTimeout { total: 2, .. })
    ));

    let sink = Arc::new(RecordingProgressSink::new());
    let follow_up = BatchUpdateRequest::builder()
        .task_ids(next)
        .target_status(TaskStatus::InProgress)
        .requested_by("release-bot")
        .progress_sink(sink.clone())
        .build()
        .expect("valid request");
    let result = engine.execute(follow_up).await.expect("second run");

    assert_accounting(&result, 1);
    assert!(result.is_completely_successful());
    assert_eq!(result.retry_count(), 0);
    let snapshots = sink.snapshots();
    assert!(!snapshots.is_empty());
    for snapshot in &snapshots {
        assert_eq!(snapshot.total_tasks, 1);
        assert!(snapshot.processed_tasks <= 1, "leaked progress: {snapshot:?}");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shut_down_engine_rejects_runs(repository: Arc<FlakyTaskRepository>) {
    let ids = repository.seed(1, TaskStatus::Todo).await;
    let engine = engine_for(&repository);

    assert_eq!(engine.shutdown().await, ShutdownOutcome::Graceful);
    let outcome = engine.execute(request(&ids, 10, 0)).await;

    assert_eq!(outcome, Err(BatchEngineError::ShutDown));
    let stored = repository
        .find_by_id(*ids.first().expect("seeded id"))
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Todo);
}
