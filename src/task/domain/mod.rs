//! Domain model for task tracking.
//!
//! Tasks carry a validated lifecycle status, a priority, and an optimistic
//! concurrency version owned by the repository. Status changes go through
//! [`Task::transition_to`], which enforces the allowed transition graph and
//! records an audit entry.

mod error;
mod ids;
mod status;
mod summary;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{TaskId, TaskTitle};
pub use status::{TaskPriority, TaskStatus};
pub use summary::TaskSummary;
pub use task::{PersistedTaskData, StatusChange, Task};
