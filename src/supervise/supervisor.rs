//! # Restart supervision for long-running operations.
//!
//! [`supervise`] keeps one operation alive: whenever it returns, it is
//! restarted. A normal return restarts immediately with the failure counter
//! reset; a failure is reported and retried after a
//! [`BackoffPolicy`] delay. [`keep_alive`] supervises a whole batch in
//! `parallel` — the typical "run all registered watchers forever" root loop.
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► run op (raced against the scope token)
//!   │     ├─ Ok      → reset attempt counter, restart immediately
//!   │     ├─ Canceled→ return Ok(())            (halt is not a failure)
//!   │     ├─ Fatal   → report, end permanently
//!   │     └─ Fail    → attempt += 1
//!   │                  ├─ delay(attempt) = Some(d) → report, sleep d, retry
//!   │                  └─ delay(attempt) = None    → report, end permanently
//! }
//! ```
//!
//! ## Rules
//! - Failures are **absorbed**, never returned to the caller: they surface
//!   as a `supervise:error` action on the bus plus a `tracing` warning.
//! - Permanent failure (budget exhausted or fatal) ends the watcher
//!   silently with a final `supervise:exhausted` action.
//! - The backoff sleep is cancellable; cancellation resolves `Ok(())`.

use tokio_util::sync::CancellationToken;

use crate::actions::{Action, Bus};
use crate::combine::parallel;
use crate::error::OpResult;
use crate::tasks::{OpFn, OpRef};

use super::backoff::BackoffPolicy;

/// Kind of the action published on each supervised failure.
pub const SUPERVISE_ERROR: &str = "supervise:error";
/// Kind of the action published when a watcher ends permanently.
pub const SUPERVISE_EXHAUSTED: &str = "supervise:exhausted";

/// Runs `op` forever, restarting it per `policy`.
///
/// Returns only when cancelled, when the failure budget is exhausted, or on
/// a fatal error — and in every case resolves `Ok(())`: supervised failures
/// are reported on `bus`, not propagated.
pub async fn supervise<T>(
    op: OpRef<T>,
    policy: BackoffPolicy,
    bus: Bus,
    token: CancellationToken,
) -> OpResult<()>
where
    T: Send + 'static,
{
    let mut attempt: u32 = 0;

    loop {
        if token.is_cancelled() {
            return Ok(());
        }

        let run = token.child_token();
        let fut = op.run(run);
        let res = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            r = fut => r,
        };

        let err = match res {
            Ok(_) => {
                // Healthy exit: back to the base of the schedule.
                attempt = 0;
                continue;
            }
            Err(e) if e.is_canceled() => return Ok(()),
            Err(e) => e,
        };

        attempt += 1;
        let delay = if err.is_retryable() {
            policy.delay(attempt)
        } else {
            None
        };

        match delay {
            Some(delay) => {
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "supervised operation failed; restarting after backoff"
                );
                bus.emit(
                    Action::new(SUPERVISE_ERROR)
                        .with_reason(err.to_string())
                        .with_interval(delay),
                );
                tokio::select! {
                    _ = token.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => {
                tracing::warn!(attempt, error = %err, "supervised operation ended permanently");
                bus.emit(Action::new(SUPERVISE_EXHAUSTED).with_reason(err.to_string()));
                return Ok(());
            }
        }
    }
}

/// Supervises every operation in `parallel`; resolves once all watchers end.
///
/// This is the root loop of a watcher fleet: with a default policy it runs
/// until `token` fires.
pub async fn keep_alive<T>(
    ops: Vec<OpRef<T>>,
    policy: BackoffPolicy,
    bus: Bus,
    token: CancellationToken,
) -> Vec<OpResult<()>>
where
    T: Send + 'static,
{
    let supervised: Vec<OpRef<()>> = ops
        .into_iter()
        .map(|op| {
            let bus = bus.clone();
            let supervised: OpRef<()> = OpFn::arc(move |ctx: CancellationToken| {
                supervise(op.clone(), policy, bus.clone(), ctx)
            });
            supervised
        })
        .collect();
    parallel(supervised, &token).wait().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::actions::Pattern;
    use crate::error::OpError;

    use super::*;

    /// Op that consults a script of outcomes, one per run; repeats the last.
    fn scripted(
        runs: Arc<AtomicU32>,
        script: &'static [Result<(), &'static str>],
    ) -> OpRef<()> {
        OpFn::arc(move |_ctx: CancellationToken| {
            let runs = runs.clone();
            async move {
                let n = runs.fetch_add(1, Ordering::SeqCst) as usize;
                match script[n.min(script.len() - 1)] {
                    Ok(()) => Ok(()),
                    Err(msg) => Err(OpError::fail(msg)),
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_retries_then_permanent_termination() {
        let runs = Arc::new(AtomicU32::new(0));
        let op = scripted(runs.clone(), &[Err("always")]);
        let bus = Bus::new(16);
        let token = CancellationToken::new();

        supervise(op, BackoffPolicy::constant(Duration::from_millis(1), 2), bus, token)
            .await
            .unwrap();

        // Initial run plus one run after each of the two allowed delays.
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_the_attempt_counter() {
        let runs = Arc::new(AtomicU32::new(0));
        // fail, fail, succeed, then fail forever: without the reset the
        // budget of 2 would already be spent when the late failures start.
        let op = scripted(
            runs.clone(),
            &[Err("a"), Err("b"), Ok(()), Err("c"), Err("d"), Err("e")],
        );
        let bus = Bus::new(16);
        let token = CancellationToken::new();

        supervise(op, BackoffPolicy::constant(Duration::from_millis(1), 2), bus, token)
            .await
            .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_not_retried() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let op: OpRef<()> = OpFn::arc(move |_ctx: CancellationToken| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(OpError::fatal("broken invariant"))
            }
        });
        let bus = Bus::new(16);
        let token = CancellationToken::new();

        supervise(op, BackoffPolicy::default(), bus, token).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_reported_on_the_bus() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let bus = Bus::new(16);
        let mut cursor = bus.subscribe();
        let op: OpRef<()> =
            OpFn::arc(|_ctx: CancellationToken| async move { Err(OpError::fail("boom")) });

        supervise(
            op,
            BackoffPolicy::constant(Duration::from_millis(1), 1),
            bus.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let report = cursor
            .next_match(&Pattern::from(SUPERVISE_ERROR))
            .await
            .unwrap();
        assert_eq!(report.reason.as_deref(), Some("execution failed: boom"));
        assert!(report.interval.is_some());

        cursor
            .next_match(&Pattern::from(SUPERVISE_EXHAUSTED))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_resolves_without_raising() {
        let bus = Bus::new(16);
        let token = CancellationToken::new();
        let op: OpRef<()> = OpFn::arc(|ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err(OpError::Canceled)
        });

        let watcher = {
            let token = token.clone();
            tokio::spawn(supervise(op, BackoffPolicy::default(), bus, token))
        };
        tokio::task::yield_now().await;
        token.cancel();
        assert_eq!(watcher.await.unwrap(), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_runs_every_watcher() {
        let runs = Arc::new(AtomicU32::new(0));
        let bus = Bus::new(16);
        let token = CancellationToken::new();

        let mut ops: Vec<OpRef<()>> = Vec::new();
        for _ in 0..3 {
            let counter = runs.clone();
            ops.push(OpFn::arc(move |ctx: CancellationToken| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    ctx.cancelled().await;
                    Ok(())
                }
            }));
        }

        let root = {
            let token = token.clone();
            tokio::spawn(keep_alive(ops, BackoffPolicy::default(), bus, token))
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        token.cancel();
        let results = root.await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_ok()));
    }
}
