//! Adapter implementations of batch ports.

mod progress;

pub use progress::{RecordingProgressSink, TracingProgressSink};
