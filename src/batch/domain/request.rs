//! Immutable batch status-update request and its builder.

use super::BatchRequestError;
use crate::batch::ports::ProgressSink;
use crate::task::domain::{TaskId, TaskStatus};
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Number of task ids per batch when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Number of conflict retries per task when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Request to move many tasks to one target status.
///
/// Built through [`BatchUpdateRequest::builder`], which enforces the
/// required fields. Task ids form an ordered set: the first occurrence of a
/// duplicated id wins.
///
/// # Examples
///
/// ```
/// use tasklane::batch::domain::BatchUpdateRequest;
/// use tasklane::task::domain::{TaskId, TaskStatus};
///
/// let request = BatchUpdateRequest::builder()
///     .task_ids([TaskId::new(), TaskId::new()])
///     .target_status(TaskStatus::InProgress)
///     .requested_by("alice")
///     .batch_size(5)
///     .build()
///     .expect("valid request");
///
/// assert_eq!(request.task_ids().len(), 2);
/// assert_eq!(request.max_retries(), 3);
/// ```
#[derive(Clone)]
pub struct BatchUpdateRequest {
    task_ids: Vec<TaskId>,
    target_status: TaskStatus,
    requested_by: String,
    reason: Option<String>,
    batch_size: NonZeroUsize,
    max_retries: u32,
    progress_sink: Option<Arc<dyn ProgressSink>>,
}

impl BatchUpdateRequest {
    /// Starts building a request.
    #[must_use]
    pub fn builder() -> BatchUpdateRequestBuilder {
        BatchUpdateRequestBuilder::default()
    }

    /// Returns the de-duplicated task ids in request order.
    #[must_use]
    pub fn task_ids(&self) -> &[TaskId] {
        &self.task_ids
    }

    /// Returns the status every task should move to.
    #[must_use]
    pub const fn target_status(&self) -> TaskStatus {
        self.target_status
    }

    /// Returns the acting user.
    #[must_use]
    pub fn requested_by(&self) -> &str {
        &self.requested_by
    }

    /// Returns the free-text reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the number of ids per batch.
    #[must_use]
    pub const fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Returns the number of conflict retries allowed per task.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the progress sink, if one was supplied.
    #[must_use]
    pub fn progress_sink(&self) -> Option<&Arc<dyn ProgressSink>> {
        self.progress_sink.as_ref()
    }
}

impl fmt::Debug for BatchUpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchUpdateRequest")
            .field("task_ids", &self.task_ids)
            .field("target_status", &self.target_status)
            .field("requested_by", &self.requested_by)
            .field("reason", &self.reason)
            .field("batch_size", &self.batch_size)
            .field("max_retries", &self.max_retries)
            .field("progress_sink", &self.progress_sink.is_some())
            .finish()
    }
}

/// Builder for [`BatchUpdateRequest`].
#[derive(Clone)]
pub struct BatchUpdateRequestBuilder {
    task_ids: Vec<TaskId>,
    target_status: Option<TaskStatus>,
    requested_by: Option<String>,
    reason: Option<String>,
    batch_size: usize,
    max_retries: u32,
    progress_sink: Option<Arc<dyn ProgressSink>>,
}

impl Default for BatchUpdateRequestBuilder {
    fn default() -> Self {
        Self {
            task_ids: Vec::new(),
            target_status: None,
            requested_by: None,
            reason: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            progress_sink: None,
        }
    }
}

impl BatchUpdateRequestBuilder {
    /// Appends task ids, keeping their order.
    #[must_use]
    pub fn task_ids(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.task_ids.extend(ids);
        self
    }

    /// Sets the target status.
    #[must_use]
    pub const fn target_status(mut self, status: TaskStatus) -> Self {
        self.target_status = Some(status);
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn requested_by(mut self, user: impl Into<String>) -> Self {
        self.requested_by = Some(user.into());
        self
    }

    /// Sets the reason recorded on every status change.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the number of ids per batch.
    #[must_use]
    pub const fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the number of conflict retries allowed per task.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the sink receiving progress snapshots.
    #[must_use]
    pub fn progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    /// Sets a closure receiving progress snapshots.
    #[must_use]
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(&super::ProgressSnapshot) + Send + Sync + 'static,
    {
        self.progress_sink(Arc::new(callback))
    }

    /// Validates the fields and builds the request.
    ///
    /// # Errors
    ///
    /// Returns [`BatchRequestError`] when no ids were supplied, the target
    /// status or acting user is missing, or the batch size is zero.
    pub fn build(self) -> Result<BatchUpdateRequest, BatchRequestError> {
        if self.task_ids.is_empty() {
            return Err(BatchRequestError::EmptyTaskIds);
        }
        let target_status = self
            .target_status
            .ok_or(BatchRequestError::MissingTargetStatus)?;
        let requested_by = self
            .requested_by
            .map(|user| user.trim().to_owned())
            .filter(|user| !user.is_empty())
            .ok_or(BatchRequestError::BlankActor)?;
        let batch_size = NonZeroUsize::new(self.batch_size)
            .ok_or(BatchRequestError::InvalidBatchSize(self.batch_size))?;

        let mut seen = HashSet::with_capacity(self.task_ids.len());
        let task_ids = self
            .task_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        Ok(BatchUpdateRequest {
            task_ids,
            target_status,
            requested_by,
            reason: self.reason,
            batch_size,
            max_retries: self.max_retries,
            progress_sink: self.progress_sink,
        })
    }
}
