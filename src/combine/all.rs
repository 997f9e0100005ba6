//! # Fail-fast concurrent aggregation.
//!
//! [`all`] runs every operation concurrently and either returns **all**
//! values, in input-index order, or the **first** error — cancelling the
//! still-running branches through their shared scope token.
//!
//! ## Rules
//! - Branches run under one child scope; the first failure cancels it.
//! - Loser cleanup is cooperative: cancelled branches unwind at their next
//!   suspension point; `all` does not wait for them.
//! - An empty batch resolves to an empty vector.

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::error::OpResult;
use crate::tasks::{OpRef, TaskHandle};

/// Runs every operation concurrently; fails fast on the first error.
///
/// On success the values come back in the same order the operations were
/// given, regardless of completion order.
pub async fn all<T>(ops: Vec<OpRef<T>>, parent: &CancellationToken) -> OpResult<Vec<T>>
where
    T: Send + 'static,
{
    let scope = parent.child_token();
    let handles: Vec<TaskHandle<T>> = ops
        .into_iter()
        .map(|op| TaskHandle::spawn(op, &scope))
        .collect();

    match try_join_all(handles.into_iter().map(TaskHandle::join)).await {
        Ok(values) => Ok(values),
        Err(e) => {
            scope.cancel();
            Err(e)
        }
    }
}
