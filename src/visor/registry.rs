//! # Visor: one watcher task per (pattern, handler) registration.
//!
//! [`Visor`] owns the action bus and a list of registrations. [`Visor::run`]
//! spawns exactly one continuously-running watcher per registration, picks
//! the loop shape from its [`WatchStrategy`], and drives the whole fleet
//! with `keep_alive` until the given token fires.
//!
//! ## Architecture
//! ```text
//! Visor { bus, cfg, registrations } ──► run(token)
//!
//!   (pattern₁, Every,  h₁) ──► supervise(take_every loop)  ─┐
//!   (pattern₂, Latest, h₂) ──► supervise(take_latest loop) ─┼─ parallel
//!   (pattern₃, Timer,  h₃) ──► supervise(timer loop)       ─┘
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use opvisor::{Action, Config, HandlerFn, Pattern, Visor, WatchStrategy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut visor = Visor::new(Config::default());
//!     visor.register(
//!         Pattern::from("user:fetch"),
//!         WatchStrategy::Every,
//!         Arc::new(HandlerFn::new(|action: Action| async move {
//!             let _ = action;
//!             Ok::<_, opvisor::OpError>(())
//!         })),
//!     );
//!
//!     let token = CancellationToken::new();
//!     let bus = visor.bus().clone();
//!     let fleet = tokio::spawn(async move { visor.run(token.clone()).await });
//!     bus.emit(Action::new("user:fetch"));
//!     fleet.abort(); // demo only; real callers cancel the token
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::actions::{Action, Bus, Pattern};
use crate::error::OpResult;
use crate::supervise::{keep_alive, poll, take_every, take_latest, take_leading, timer};
use crate::tasks::{OpFn, OpRef};

use super::config::Config;

/// An action handler hooked into a watcher registration.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Processes one matching action.
    async fn call(&self, action: Action) -> OpResult<()>;
}

/// Shared handler handle stored in a registration.
pub type HandlerRef = Arc<dyn Handler>;

/// Function-backed handler.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Wraps the function as a handler.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the function and returns it as a shared handler handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Action) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OpResult<()>> + Send + 'static,
{
    async fn call(&self, action: Action) -> OpResult<()> {
        (self.f)(action).await
    }
}

/// Watcher loop shape for a registration.
///
/// `None` fields fall back to the fleet's [`Config`] defaults.
#[derive(Clone, Debug, Default)]
pub enum WatchStrategy {
    /// Spawn a handler per match, unlimited concurrency (default).
    #[default]
    Every,
    /// Halt the previous handler before each new match; newest wins.
    Latest,
    /// Run the handler inline; matches while busy are dropped.
    Leading,
    /// Fire repeatedly between a trigger match and a cancel match.
    Poll {
        /// Period between runs; `None` = `Config::poll_interval`.
        every: Option<std::time::Duration>,
        /// Off-switch pattern; `None` = the registration's own pattern.
        cancel: Option<Pattern>,
    },
    /// Debounce per `action.key` over a suppression window.
    Timer {
        /// Window length; `None` = `Config::timer_window`.
        window: Option<std::time::Duration>,
    },
}

struct Registration {
    pattern: Pattern,
    strategy: WatchStrategy,
    handler: HandlerRef,
}

/// Owns the bus and a fleet of watcher registrations.
pub struct Visor {
    cfg: Config,
    bus: Bus,
    registrations: Vec<Registration>,
}

impl Visor {
    /// Creates an empty fleet with its own bus.
    pub fn new(cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        Self {
            cfg,
            bus,
            registrations: Vec::new(),
        }
    }

    /// Returns the fleet's bus; clone it to publish from anywhere.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Appends a registration; one watcher task will serve it.
    pub fn register(
        &mut self,
        pattern: Pattern,
        strategy: WatchStrategy,
        handler: HandlerRef,
    ) -> &mut Self {
        self.registrations.push(Registration {
            pattern,
            strategy,
            handler,
        });
        self
    }

    /// Runs every registered watcher under supervision until `token` fires.
    ///
    /// Returns one result per registration, in registration order.
    pub async fn run(&self, token: CancellationToken) -> Vec<OpResult<()>> {
        let ops: Vec<OpRef<()>> = self
            .registrations
            .iter()
            .map(|reg| self.watcher_op(reg))
            .collect();
        keep_alive(ops, self.cfg.backoff, self.bus.clone(), token).await
    }

    /// Builds the continuously-running watcher operation for one registration.
    fn watcher_op(&self, reg: &Registration) -> OpRef<()> {
        let bus = self.bus.clone();
        let pattern = reg.pattern.clone();
        let strategy = reg.strategy.clone();
        let handler = reg.handler.clone();
        let poll_interval = self.cfg.poll_interval;
        let timer_window = self.cfg.timer_window;

        OpFn::arc(move |ctx: CancellationToken| {
            let bus = bus.clone();
            let pattern = pattern.clone();
            let strategy = strategy.clone();
            let handler = handler.clone();
            async move {
                let call = move |action: Action| {
                    let handler = handler.clone();
                    async move { handler.call(action).await }
                };
                match strategy {
                    WatchStrategy::Every => take_every(&bus, &pattern, call, &ctx).await,
                    WatchStrategy::Latest => take_latest(&bus, &pattern, call, &ctx).await,
                    WatchStrategy::Leading => take_leading(&bus, &pattern, call, &ctx).await,
                    WatchStrategy::Poll { every, cancel } => {
                        poll(
                            &bus,
                            &pattern,
                            cancel.as_ref(),
                            every.unwrap_or(poll_interval),
                            call,
                            &ctx,
                        )
                        .await
                    }
                    WatchStrategy::Timer { window } => {
                        timer(&bus, &pattern, window.unwrap_or(timer_window), call, &ctx).await
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tokio::time::sleep;

    use crate::error::OpError;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fleet_serves_each_registration() {
        let every = Arc::new(AtomicU32::new(0));
        let leading = Arc::new(AtomicU32::new(0));

        let mut visor = Visor::new(Config::default());
        {
            let every = every.clone();
            visor.register(
                Pattern::from("a"),
                WatchStrategy::Every,
                HandlerFn::arc(move |_action: Action| {
                    let every = every.clone();
                    async move {
                        every.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
            );
        }
        {
            let leading = leading.clone();
            visor.register(
                Pattern::from("b"),
                WatchStrategy::Leading,
                HandlerFn::arc(move |_action: Action| {
                    let leading = leading.clone();
                    async move {
                        leading.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
            );
        }

        let bus = visor.bus().clone();
        let token = CancellationToken::new();
        let fleet = {
            let token = token.clone();
            tokio::spawn(async move { visor.run(token).await })
        };
        sleep(Duration::from_millis(1)).await;

        bus.emit_all([Action::new("a"), Action::new("a"), Action::new("b")]);
        sleep(Duration::from_millis(1)).await;
        assert_eq!(every.load(Ordering::SeqCst), 2);
        assert_eq!(leading.load(Ordering::SeqCst), 1);

        token.cancel();
        let results = fleet.await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_watcher_is_restarted_by_supervision() {
        let runs = Arc::new(AtomicU32::new(0));

        let mut visor = Visor::new(Config::default());
        {
            let runs = runs.clone();
            visor.register(
                Pattern::from("boom"),
                WatchStrategy::Leading,
                HandlerFn::arc(move |_action: Action| {
                    let runs = runs.clone();
                    async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Err(OpError::fail("handler broke"))
                    }
                }),
            );
        }

        let bus = visor.bus().clone();
        let token = CancellationToken::new();
        let fleet = {
            let token = token.clone();
            tokio::spawn(async move { visor.run(token).await })
        };
        sleep(Duration::from_millis(1)).await;

        // First failure kills the watcher loop; supervision restarts it
        // after backoff and the next action is handled again.
        bus.emit(Action::new("boom"));
        sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(100)).await;
        bus.emit(Action::new("boom"));
        sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        token.cancel();
        fleet.await.unwrap();
    }
}
