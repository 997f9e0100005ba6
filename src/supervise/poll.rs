//! # Trigger-driven polling.
//!
//! [`poll`] waits for a trigger action, then invokes the handler on a fixed
//! cadence until a cancel action arrives — a race between the fire loop and
//! the cancel take. With no explicit cancel pattern the trigger pattern
//! doubles as the off switch, making the trigger action a toggle.
//!
//! ```text
//! take(trigger) ──► loop { handler(action); sleep(every) } ─┐
//!                       ▲                                   │ race
//!                   take(cancel) ───────────────────────────┘
//! ```
//!
//! ## Rules
//! - The trigger action's `interval` field overrides the configured period
//!   for that polling session.
//! - The cancel cursor opens before the first handler run, so a cancel
//!   emitted mid-handler still lands.
//! - Triggers arriving while a session is active are not queued; after a
//!   cancel, the next trigger starts a fresh session.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::actions::{Action, Bus, Pattern};
use crate::error::OpResult;

/// Polls `handler` every `every` between a trigger and a cancel action.
///
/// `cancel` defaults to the trigger pattern itself.
pub async fn poll<H, Fut>(
    bus: &Bus,
    trigger: &Pattern,
    cancel: Option<&Pattern>,
    every: Duration,
    handler: H,
    token: &CancellationToken,
) -> OpResult<()>
where
    H: Fn(Action) -> Fut + Send + Sync,
    Fut: Future<Output = OpResult<()>> + Send,
{
    let cancel = cancel.unwrap_or(trigger);
    loop {
        let action = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            a = bus.take(trigger) => a?,
        };
        let every = action.interval.unwrap_or(every);

        // Open the off switch before the first run.
        let mut cancels = bus.subscribe();
        let fire = async {
            loop {
                handler(action.clone()).await?;
                tokio::time::sleep(every).await;
            }
            #[allow(unreachable_code)]
            Ok::<(), crate::error::OpError>(())
        };

        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            a = cancels.next_match(cancel) => { a?; }
            res = fire => { res?; }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tokio::time::sleep;

    use crate::error::OpError;

    use super::*;

    fn counting_poller(
        bus: &Bus,
        count: &Arc<AtomicU32>,
        token: &CancellationToken,
    ) -> tokio::task::JoinHandle<OpResult<()>> {
        let bus = bus.clone();
        let count = count.clone();
        let token = token.clone();
        tokio::spawn(async move {
            let trigger = Pattern::from("poll");
            poll(
                &bus,
                &trigger,
                None,
                Duration::from_secs(999),
                move |_action| {
                    let count = count.clone();
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                &token,
            )
            .await
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_toggles_the_fire_loop() {
        let bus = Bus::new(16);
        let count = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        counting_poller(&bus, &count, &token);
        tokio::task::yield_now().await;

        // Trigger with a 10ms override: runs at t=0, 10, 20.
        bus.emit(Action::new("poll").with_interval(Duration::from_millis(10)));
        sleep(Duration::from_millis(25)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        // Same action again: cancels the session instead of stacking one.
        bus.emit(Action::new("poll"));
        sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        // And a third one starts fresh.
        bus.emit(Action::new("poll").with_interval(Duration::from_millis(10)));
        sleep(Duration::from_millis(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);

        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_cancel_pattern() {
        let bus = Bus::new(16);
        let count = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        {
            let bus = bus.clone();
            let count = count.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let trigger = Pattern::from("poll");
                let cancel = Pattern::from("poll:stop");
                poll(
                    &bus,
                    &trigger,
                    Some(&cancel),
                    Duration::from_millis(10),
                    move |_action| {
                        let count = count.clone();
                        async move {
                            count.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    },
                    &token,
                )
                .await
            });
        }
        tokio::task::yield_now().await;

        bus.emit(Action::new("poll"));
        sleep(Duration::from_millis(15)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // Another trigger is not the off switch here.
        bus.emit(Action::new("poll"));
        sleep(Duration::from_millis(1)).await;
        let before = count.load(Ordering::SeqCst);

        bus.emit(Action::new("poll:stop"));
        sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);

        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_failure_propagates() {
        let bus = Bus::new(16);
        let token = CancellationToken::new();
        let watcher = {
            let bus = bus.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let trigger = Pattern::from("poll");
                poll(
                    &bus,
                    &trigger,
                    None,
                    Duration::from_millis(10),
                    |_action| async move { Err(OpError::fail("probe failed")) },
                    &token,
                )
                .await
            })
        };
        tokio::task::yield_now().await;

        bus.emit(Action::new("poll"));
        assert_eq!(
            watcher.await.unwrap(),
            Err(OpError::fail("probe failed"))
        );
    }
}
