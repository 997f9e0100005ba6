//! # Operation abstraction.
//!
//! An [`Op`] is a suspendable unit of work: it receives a
//! [`CancellationToken`] and resolves to an [`OpResult`]. Implementors should
//! check the token at convenient points and wind down promptly once it fires.
//!
//! Operations are **re-runnable**: `run` takes `&self` and may be invoked any
//! number of times (`supervise` restarts the same operation after every
//! exit). State shared across runs goes behind an explicit `Arc`.
//!
//! ## Example
//! ```
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use opvisor::{Op, OpResult};
//!
//! struct Heartbeat;
//!
//! #[async_trait]
//! impl Op<u32> for Heartbeat {
//!     async fn run(&self, ctx: CancellationToken) -> OpResult<u32> {
//!         if ctx.is_cancelled() {
//!             return Err(opvisor::OpError::Canceled);
//!         }
//!         Ok(1)
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::OpResult;

/// An asynchronous, cancellable unit of work.
#[async_trait]
pub trait Op<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Executes the operation until completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> OpResult<T>;
}

/// Shared handle to an operation, the currency of every combinator.
pub type OpRef<T> = Arc<dyn Op<T>>;
