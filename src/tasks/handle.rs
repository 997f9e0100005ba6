//! # TaskHandle: a spawned, independently-cancellable operation.
//!
//! [`TaskHandle::spawn`] runs an operation on the tokio runtime under a
//! **child** of the given cancellation token, so halting a parent scope
//! transitively halts every task spawned under it.
//!
//! ## Rules
//! - [`TaskHandle::join`] waits for the outcome; a halted task resolves to
//!   `Err(Canceled)`, a panicked one to `Err(Fail)`.
//! - [`TaskHandle::halt`] is cooperative: it fires the token, then waits for
//!   the task to unwind at its next suspension point. Halting a finished
//!   task is a no-op.
//! - [`TaskHandle::cancel`] fires the token without waiting — the
//!   fire-and-forget half of `halt`, for best-effort cleanup of race losers.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{OpError, OpResult};

use super::op::OpRef;

/// Handle to a running operation.
#[derive(Debug)]
pub struct TaskHandle<T> {
    join: JoinHandle<OpResult<T>>,
    token: CancellationToken,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawns `op` under a child of `parent`.
    pub fn spawn(op: OpRef<T>, parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        let run = token.clone();
        Self::from_parts(
            async move {
                let child = run.clone();
                let fut = op.run(child);
                // Poll the operation first so a cooperative exit wins over
                // the forced Canceled outcome.
                tokio::select! {
                    biased;
                    res = fut => res,
                    _ = run.cancelled() => Err(OpError::Canceled),
                }
            },
            token,
        )
    }

    /// Spawns an already-built future under a child of `parent`.
    ///
    /// The future is raced against the child token, so it stops at its next
    /// suspension point once the token fires, even if it never looks at a
    /// token itself.
    pub fn spawn_future<Fut>(fut: Fut, parent: &CancellationToken) -> Self
    where
        Fut: Future<Output = OpResult<T>> + Send + 'static,
    {
        let token = parent.child_token();
        let run = token.clone();
        Self::from_parts(
            async move {
                tokio::select! {
                    biased;
                    res = fut => res,
                    _ = run.cancelled() => Err(OpError::Canceled),
                }
            },
            token,
        )
    }

    fn from_parts<Fut>(fut: Fut, token: CancellationToken) -> Self
    where
        Fut: Future<Output = OpResult<T>> + Send + 'static,
    {
        Self {
            join: tokio::spawn(fut),
            token,
        }
    }

    /// Waits for the task's outcome.
    pub async fn join(self) -> OpResult<T> {
        match self.join.await {
            Ok(res) => res,
            Err(e) if e.is_panic() => Err(OpError::fail(format!("task panicked: {e}"))),
            Err(_) => Err(OpError::Canceled),
        }
    }

    /// Cooperatively cancels the task and waits for it to unwind.
    pub async fn halt(self) {
        self.token.cancel();
        let _ = self.join.await;
    }

    /// Fires the task's token without waiting for it to unwind.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the task has produced its outcome.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use crate::tasks::OpFn;

    use super::*;

    #[tokio::test]
    async fn test_join_returns_value() {
        let root = CancellationToken::new();
        let handle = TaskHandle::spawn(
            OpFn::arc(|_ctx: CancellationToken| async move { Ok::<_, OpError>(41 + 1) }),
            &root,
        );
        assert_eq!(handle.join().await, Ok(42));
    }

    #[tokio::test]
    async fn test_halt_resolves_without_raising() {
        let root = CancellationToken::new();
        let handle: TaskHandle<()> = TaskHandle::spawn(
            OpFn::arc(|ctx: CancellationToken| async move {
                ctx.cancelled().await;
                Err(OpError::Canceled)
            }),
            &root,
        );
        // Completes even though the op only exits via its token.
        handle.halt().await;
    }

    #[tokio::test]
    async fn test_halting_parent_halts_children() {
        let root = CancellationToken::new();
        let handle: TaskHandle<()> = TaskHandle::spawn(
            OpFn::arc(|_ctx: CancellationToken| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, OpError>(())
            }),
            &root,
        );
        root.cancel();
        assert_eq!(handle.join().await, Err(OpError::Canceled));
    }

    #[tokio::test]
    async fn test_panic_surfaces_as_failure() {
        let root = CancellationToken::new();
        let handle: TaskHandle<()> = TaskHandle::spawn_future(
            async move {
                if true {
                    panic!("boom");
                }
                Ok(())
            },
            &root,
        );
        let err = handle.join().await.unwrap_err();
        assert_eq!(err.as_label(), "op_failed");
    }

    #[tokio::test]
    async fn test_halt_is_idempotent_per_token() {
        let root = CancellationToken::new();
        let handle: TaskHandle<()> =
            TaskHandle::spawn_future(async move { Ok(()) }, &root);
        // Cancel twice before halting a task that may already be done.
        handle.cancel();
        handle.cancel();
        handle.halt().await;
    }
}
