//! Port contracts for batch runs.

mod progress;

pub use progress::ProgressSink;
