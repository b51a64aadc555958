//! Order-preserving split of task ids into batches.

use crate::task::domain::TaskId;
use std::num::NonZeroUsize;

/// Splits `ids` into contiguous batches of `batch_size`.
///
/// Concatenating the batches reproduces `ids`. Only the last batch may be
/// shorter.
#[must_use]
pub fn partition(ids: &[TaskId], batch_size: NonZeroUsize) -> Vec<Vec<TaskId>> {
    ids.chunks(batch_size.get()).map(<[TaskId]>::to_vec).collect()
}
