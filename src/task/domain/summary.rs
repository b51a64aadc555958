//! Read-only task projection returned by batch operations.

use super::{Task, TaskId, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Status at the time the snapshot was taken.
    pub status: TaskStatus,
    /// Task priority.
    pub priority: TaskPriority,
    /// Persisted revision.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().as_str().to_owned(),
            status: task.status(),
            priority: task.priority(),
            version: task.version(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}
