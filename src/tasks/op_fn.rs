//! # Function-backed operation (`OpFn`).
//!
//! [`OpFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh future per run. Because the closure is `Fn` (not `FnMut`), restarts
//! never observe leftover state from a previous run; share state across runs
//! with an explicit `Arc` inside the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use opvisor::{OpFn, OpRef, OpResult};
//!
//! let op: OpRef<u32> = OpFn::arc(|_ctx: CancellationToken| async move {
//!     Ok::<_, opvisor::OpError>(7)
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::OpResult;

use super::op::Op;

/// Operation backed by a future-producing closure.
pub struct OpFn<F> {
    f: F,
}

impl<F> OpFn<F> {
    /// Wraps the closure as an operation.
    ///
    /// Prefer [`OpFn::arc`] when you immediately need an
    /// [`OpRef`](super::OpRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, T> Op<T> for OpFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OpResult<T>> + Send + 'static,
    T: Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> OpResult<T> {
        (self.f)(ctx).await
    }
}
