//! Batch splitting for bulk remote calls
//!
//! The SSM DeleteParameters call accepts at most ten names per request, so
//! delete sweeps are split into contiguous, order-preserving chunks.

use crate::error::{Result, SyncError};

/// Maximum number of names the bulk delete call accepts per request.
pub const DELETE_BATCH_MAX: usize = 10;

/// Split `items` into contiguous sub-slices of at most `max_size` elements,
/// preserving order. The last chunk may be shorter. An empty input yields no
/// chunks; a zero `max_size` is a configuration error.
pub fn chunks<T>(items: &[T], max_size: usize) -> Result<Vec<&[T]>> {
    if max_size == 0 {
        return Err(SyncError::Config(format!(
            "Invalid chunk size: {max_size}"
        )));
    }
    Ok(items.chunks(max_size).collect())
}
