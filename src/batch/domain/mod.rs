//! Domain types for batch status updates.
//!
//! A [`BatchUpdateRequest`] names the tasks and the target status. Running it
//! yields a [`BatchOperationResult`] in which every per-task problem is a
//! [`BatchOperationError`] value; [`ProgressSnapshot`]s are emitted while the
//! run is in flight.

mod error;
mod progress;
mod request;
mod result;

pub use error::{BatchErrorKind, BatchOperationError, BatchRequestError};
pub use progress::ProgressSnapshot;
pub use request::{
    BatchUpdateRequest, BatchUpdateRequestBuilder, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES,
};
pub use result::{BatchOperationResult, metric};
pub(crate) use result::percentage;
