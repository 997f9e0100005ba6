//! # Action-driven watcher loops.
//!
//! Three strategies for reacting to matching actions, differing in what
//! happens when actions arrive faster than handlers finish:
//!
//! | watcher | concurrency | busy behavior |
//! |---|---|---|
//! | [`take_every`] | unlimited | every match spawns a handler |
//! | [`take_latest`] | at most one | previous handler is halted, newest wins |
//! | [`take_leading`] | at most one | matches while busy are dropped |
//!
//! ## Rules
//! - `take_every` and `take_latest` hold one cursor open for the life of the
//!   loop, so no match is ever missed; their handlers run as fire-and-forget
//!   child tasks tied to the watcher's token.
//! - `take_leading` deliberately re-subscribes per iteration: actions that
//!   arrive while its handler runs are dropped, not queued.
//! - Handler failures in `take_leading` propagate to the caller (typically
//!   `supervise`, which restarts the loop); fire-and-forget handlers absorb
//!   their own outcomes.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::actions::{Action, Bus, Pattern};
use crate::error::OpResult;
use crate::tasks::TaskHandle;

/// Spawns `handler` fire-and-forget for every matching action.
pub async fn take_every<H, Fut>(
    bus: &Bus,
    pattern: &Pattern,
    handler: H,
    token: &CancellationToken,
) -> OpResult<()>
where
    H: Fn(Action) -> Fut + Send + Sync,
    Fut: Future<Output = OpResult<()>> + Send + 'static,
{
    let mut cursor = bus.subscribe();
    loop {
        let action = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            a = cursor.next_match(pattern) => a?,
        };
        // Dropping the handle detaches the task; it stays tied to our token.
        let _child: TaskHandle<()> = TaskHandle::spawn_future(handler(action), token);
    }
}

/// Spawns `handler` per matching action, halting the previous handler first.
///
/// At most one handler is active at a time; the newest request wins.
pub async fn take_latest<H, Fut>(
    bus: &Bus,
    pattern: &Pattern,
    handler: H,
    token: &CancellationToken,
) -> OpResult<()>
where
    H: Fn(Action) -> Fut + Send + Sync,
    Fut: Future<Output = OpResult<()>> + Send + 'static,
{
    let mut cursor = bus.subscribe();
    let mut last: Option<TaskHandle<()>> = None;
    loop {
        let action = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            a = cursor.next_match(pattern) => a?,
        };
        if let Some(prev) = last.take() {
            prev.halt().await;
        }
        last = Some(TaskHandle::spawn_future(handler(action), token));
    }
}

/// Runs `handler` inline per matching action; matches while busy are dropped.
///
/// The loop blocks on the handler, and subscribes afresh afterwards, so
/// actions emitted during a run are never queued up behind it.
pub async fn take_leading<H, Fut>(
    bus: &Bus,
    pattern: &Pattern,
    handler: H,
    token: &CancellationToken,
) -> OpResult<()>
where
    H: Fn(Action) -> Fut + Send + Sync,
    Fut: Future<Output = OpResult<()>> + Send,
{
    loop {
        let action = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            a = bus.take(pattern) => a?,
        };
        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            res = handler(action) => res?,
        }
    }
}
