//! # Never-throwing fan-out with two observation streams.
//!
//! [`parallel`] runs every operation concurrently, wrapping each branch so
//! its outcome is captured as an [`OpResult`] — one branch failing never
//! cancels its siblings and never unwinds the caller.
//!
//! ## Observing results
//! ```text
//!              ┌─► immediate (completion order, as each branch settles)
//! parallel ────┼─► sequence  (input order; index i available as soon as
//!              │              branch i settles, regardless of the others)
//!              └─► wait()    (Vec<OpResult<T>> in input order, once all settle)
//! ```
//!
//! ## Rules
//! - Both channels deliver exactly one item per branch and close once the
//!   sequence pass completes.
//! - Cancelling the parent scope resolves remaining branches to
//!   `Err(Canceled)`; `wait()` still returns the full vector.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{OpError, OpResult};
use crate::tasks::OpRef;

/// Running [`parallel`] fan-out; see the module docs for the three views.
pub struct Parallel<T> {
    /// Per-branch results in completion order.
    pub immediate: mpsc::UnboundedReceiver<OpResult<T>>,
    /// Per-branch results in input order.
    pub sequence: mpsc::UnboundedReceiver<OpResult<T>>,
    driver: JoinHandle<Vec<OpResult<T>>>,
}

impl<T: Send + 'static> Parallel<T> {
    /// Waits for every branch and returns their results in input order.
    pub async fn wait(self) -> Vec<OpResult<T>> {
        // The driver only joins branches and sends on unbounded channels;
        // it has no failure path of its own.
        self.driver.await.unwrap_or_default()
    }
}

/// Runs every operation concurrently, capturing each outcome as a `Result`.
///
/// `T: Clone` because one branch outcome feeds the `immediate` stream, the
/// `sequence` stream, and the final vector.
pub fn parallel<T>(ops: Vec<OpRef<T>>, parent: &CancellationToken) -> Parallel<T>
where
    T: Clone + Send + 'static,
{
    let scope = parent.child_token();
    let (imm_tx, immediate) = mpsc::unbounded_channel();
    let (seq_tx, sequence) = mpsc::unbounded_channel();

    let mut branches = Vec::with_capacity(ops.len());
    for op in ops {
        let token = scope.child_token();
        let imm_tx = imm_tx.clone();
        branches.push(tokio::spawn(async move {
            let inner = token.clone();
            let fut = op.run(inner);
            let res = tokio::select! {
                biased;
                r = fut => r,
                _ = token.cancelled() => Err(OpError::Canceled),
            };
            let _ = imm_tx.send(res.clone());
            res
        }));
    }
    drop(imm_tx);

    let driver = tokio::spawn(async move {
        let mut results = Vec::with_capacity(branches.len());
        for branch in branches {
            let res = match branch.await {
                Ok(res) => res,
                Err(e) if e.is_panic() => Err(OpError::fail(format!("branch panicked: {e}"))),
                Err(_) => Err(OpError::Canceled),
            };
            let _ = seq_tx.send(res.clone());
            results.push(res);
        }
        results
    });

    Parallel {
        immediate,
        sequence,
        driver,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;
    use tokio_util::sync::CancellationToken;

    use crate::tasks::OpFn;

    use super::*;

    fn after(delay: Duration, value: &'static str) -> OpRef<&'static str> {
        OpFn::arc(move |_ctx: CancellationToken| async move {
            sleep(delay).await;
            Ok(value)
        })
    }

    fn failing(delay: Duration, message: &'static str) -> OpRef<&'static str> {
        OpFn::arc(move |_ctx: CancellationToken| async move {
            sleep(delay).await;
            Err(OpError::fail(message))
        })
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<OpResult<&'static str>>) -> Vec<OpResult<&'static str>> {
        let mut out = Vec::new();
        while let Some(res) = rx.recv().await {
            out.push(res);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_stream_is_completion_ordered() {
        let root = CancellationToken::new();
        let group = parallel(
            vec![
                after(Duration::from_millis(20), "second"),
                after(Duration::from_millis(10), "first"),
            ],
            &root,
        );
        let seen = drain(group.immediate).await;
        assert_eq!(seen, [Ok("first"), Ok("second")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_stream_is_input_ordered() {
        let root = CancellationToken::new();
        let group = parallel(
            vec![
                after(Duration::from_millis(20), "second"),
                after(Duration::from_millis(10), "first"),
            ],
            &root,
        );
        let seen = drain(group.sequence).await;
        assert_eq!(seen, [Ok("second"), Ok("first")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_input_order_with_failures_captured() {
        let root = CancellationToken::new();
        let group = parallel(
            vec![
                failing(Duration::from_millis(5), "boom"),
                after(Duration::from_millis(15), "alive"),
            ],
            &root,
        );
        let results = group.wait().await;
        // The early failure did not cancel its sibling.
        assert_eq!(results, [Err(OpError::fail("boom")), Ok("alive")]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let root = CancellationToken::new();
        let group: Parallel<&'static str> = parallel(Vec::new(), &root);
        assert!(group.wait().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_resolves_branches_canceled() {
        let root = CancellationToken::new();
        let group = parallel(vec![after(Duration::from_secs(60), "late")], &root);
        root.cancel();
        assert_eq!(group.wait().await, [Err(OpError::Canceled)]);
    }
}
