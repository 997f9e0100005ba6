//! # Action bus: broadcast transport with independent cursors.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] providing
//! non-blocking publishing from many sources and independent read cursors.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                     Cursors (many, independent):
//!   emit / emit_all ──┐
//!   supervise reports ┼──► Bus ──┬──► BusCursor (take_every loop)
//!   poll / timer    ──┘          ├──► BusCursor (take_latest loop)
//!                                └──► Bus::take (one-shot)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `emit()` never blocks or fails; with no live
//!   cursors the action is dropped.
//! - **Broadcast, not a work queue**: every cursor sees every action emitted
//!   after it subscribed, in emission order.
//! - **No gap**: subscription is synchronous — a cursor obtained before an
//!   emit is guaranteed to observe that emit. Watcher loops therefore open
//!   their cursor once, before entering the loop.
//! - **Lag**: a cursor that falls behind the ring buffer skips the missed
//!   actions and keeps going (the bus favors liveness over completeness).

use tokio::sync::broadcast;

use crate::error::{OpError, OpResult};

use super::action::Action;
use super::pattern::Pattern;

/// Broadcast channel for actions.
///
/// Cheap to clone; all clones publish into the same ring buffer.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Action>,
}

impl Bus {
    /// Creates a new bus with the given ring-buffer capacity (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes one action to every live cursor.
    pub fn emit(&self, action: Action) {
        let _ = self.tx.send(action);
    }

    /// Publishes a batch of actions; an empty batch is a no-op.
    ///
    /// Each send is atomic and the batch lands in input order.
    pub fn emit_all<I>(&self, actions: I)
    where
        I: IntoIterator<Item = Action>,
    {
        for action in actions {
            self.emit(action);
        }
    }

    /// Opens an independent cursor observing all subsequent actions.
    pub fn subscribe(&self) -> BusCursor {
        BusCursor {
            rx: self.tx.subscribe(),
        }
    }

    /// Waits for the next action matching `pattern` on a fresh cursor.
    ///
    /// The cursor is created synchronously inside this call, so any action
    /// emitted after `take` returns its future is observed. Actions emitted
    /// before the call are not; callers that must not miss anything hold a
    /// [`BusCursor`] instead.
    pub async fn take(&self, pattern: &Pattern) -> OpResult<Action> {
        self.subscribe().next_match(pattern).await
    }
}

/// Independent read cursor over a [`Bus`].
#[derive(Debug)]
pub struct BusCursor {
    rx: broadcast::Receiver<Action>,
}

impl BusCursor {
    /// Returns the next action on the bus, skipping over lag.
    ///
    /// Fails with [`OpError::BusClosed`] once the bus has shut down.
    pub async fn next(&mut self) -> OpResult<Action> {
        loop {
            match self.rx.recv().await {
                Ok(action) => return Ok(action),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(OpError::BusClosed),
            }
        }
    }

    /// Consumes actions until one matches `pattern`, returning it.
    pub async fn next_match(&mut self, pattern: &Pattern) -> OpResult<Action> {
        loop {
            let action = self.next().await?;
            if pattern.matches(&action) {
                return Ok(action);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_take_skips_non_matching_actions() {
        let bus = Bus::new(16);
        let pattern = Pattern::from("hit");

        let waiter = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.take(&pattern).await })
        };
        tokio::task::yield_now().await;

        bus.emit(Action::new("miss"));
        bus.emit(Action::new("hit").with_key("k"));

        let action = waiter.await.unwrap().unwrap();
        assert_eq!(action.kind.as_ref(), "hit");
        assert_eq!(action.key.as_deref(), Some("k"));
    }

    #[tokio::test]
    async fn test_concurrent_cursors_each_see_every_action() {
        let bus = Bus::new(16);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit_all([Action::new("one"), Action::new("two")]);

        for cursor in [&mut a, &mut b] {
            assert_eq!(cursor.next().await.unwrap().kind.as_ref(), "one");
            assert_eq!(cursor.next().await.unwrap().kind.as_ref(), "two");
        }
    }

    #[tokio::test]
    async fn test_cursor_opened_before_emit_has_no_gap() {
        let bus = Bus::new(16);
        let mut cursor = bus.subscribe();
        // Emitted before the first read, after subscription: must be seen.
        bus.emit(Action::new("early"));
        assert_eq!(cursor.next().await.unwrap().kind.as_ref(), "early");
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let bus = Bus::new(16);
        let mut cursor = bus.subscribe();
        bus.emit_all([]);
        bus.emit(Action::new("after"));
        assert_eq!(cursor.next().await.unwrap().kind.as_ref(), "after");
    }

    #[tokio::test]
    async fn test_closed_bus_reports_bus_closed() {
        let bus = Bus::new(16);
        let mut cursor = bus.subscribe();
        drop(bus);
        assert!(matches!(cursor.next().await, Err(OpError::BusClosed)));
    }
}
