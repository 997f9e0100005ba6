//! # Per-key debounce windows.
//!
//! [`timer`] runs the handler once per distinct `action.key`, then
//! suppresses further triggers bearing that key until the window elapses or
//! a [`clear_timers`] action names the key (or `"*"` for all keys).
//!
//! One window task exists per live key:
//! ```text
//! trigger(key) ──► not in map? ──► spawn { handler(action)
//!                                          race(sleep(window), take(clear(key))) }
//!                  in map?     ──► suppressed
//! ```
//!
//! ## Rules
//! - The key→task map is owned exclusively by the watcher loop; window
//!   tasks never touch it. Finished windows are pruned on the next trigger.
//! - A window task subscribes to clear actions **before** running the
//!   handler, so a clear emitted mid-handler still cuts the window short.
//! - Triggers without a `key` are ignored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::actions::{Action, Bus, Pattern};
use crate::error::OpResult;
use crate::tasks::TaskHandle;

/// Kind of the action that cuts debounce windows short.
pub const CLEAR_TIMERS: &str = "clear-timers";

/// Builds a clear-timers action targeting the given keys (`"*"` = all).
pub fn clear_timers<I, S>(keys: I) -> Action
where
    I: IntoIterator<Item = S>,
    S: Into<Arc<str>>,
{
    Action::new(CLEAR_TIMERS).with_keys(keys)
}

/// Matches a clear-timers action that names `key` or the wildcard.
fn clear_pattern(key: Arc<str>) -> Pattern {
    Pattern::predicate(move |a: &Action| {
        a.kind.as_ref() == CLEAR_TIMERS
            && a.keys
                .as_ref()
                .is_some_and(|keys| keys.iter().any(|k| k.as_ref() == "*" || *k == key))
    })
}

/// Debounces `handler` per `action.key` over a suppression `window`.
pub async fn timer<H, Fut>(
    bus: &Bus,
    pattern: &Pattern,
    window: Duration,
    handler: H,
    token: &CancellationToken,
) -> OpResult<()>
where
    H: Fn(Action) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OpResult<()>> + Send + 'static,
{
    let handler = Arc::new(handler);
    let mut windows: HashMap<Arc<str>, TaskHandle<()>> = HashMap::new();
    let mut cursor = bus.subscribe();

    loop {
        let action = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            a = cursor.next_match(pattern) => a?,
        };
        let Some(key) = action.key.clone() else {
            tracing::debug!(kind = %action.kind, "timer trigger without a key; ignored");
            continue;
        };

        windows.retain(|_, task| !task.is_finished());
        if windows.contains_key(&key) {
            continue;
        }

        let fut = {
            let handler = handler.clone();
            let clear = clear_pattern(key.clone());
            // Subscribe before the handler runs: a clear emitted while the
            // handler is still working must end the window.
            let mut clears = bus.subscribe();
            async move {
                if let Err(e) = (*handler)(action).await {
                    tracing::warn!(error = %e, "debounced handler failed");
                }
                tokio::select! {
                    _ = tokio::time::sleep(window) => {}
                    _ = clears.next_match(&clear) => {}
                }
                Ok(())
            }
        };
        windows.insert(key, TaskHandle::spawn_future(fut, token));
    }
}
