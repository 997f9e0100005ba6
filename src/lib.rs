//! # opvisor
//!
//! **Opvisor** is an effects/coordination substrate for async Rust.
//!
//! It composes asynchronous, cancellable units of work ("operations") into
//! larger behaviors: ordered middleware pipelines, fan-out/fan-in
//! aggregation, racing, and self-healing long-running watchers driven by a
//! pattern-matched action bus. The crate performs no I/O itself; it is a
//! cooperative coordination layer for higher-level query and state layers
//! to build on.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ registration │   │ registration │   │ registration │
//!     │ (pattern,h₁) │   │ (pattern,h₂) │   │ (pattern,h₃) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Visor (watcher fleet)                                            │
//! │  - Bus (broadcast actions)                                        │
//! │  - keep_alive: parallel ∘ supervise over every watcher            │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//!   │ take_every   │  │ take_latest  │  │ poll / timer │   (watcher loops)
//!   │ (fan-out)    │  │ (newest wins)│  │ (cadence)    │
//!   └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!          │ handlers run as │ TaskHandle      │
//!          ▼ child tasks     ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │              Bus (tokio broadcast, independent cursors)           │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Building blocks
//! | Area | Description | Key types / functions |
//! |---|---|---|
//! | **Actions** | Pattern-matched publish/subscribe bus. | [`Action`], [`Pattern`], [`Bus`] |
//! | **Pipelines** | Ordered middleware over a mutable context. | [`compose`], [`Middleware`], [`Next`] |
//! | **Tasks** | Cancellable operations and spawned handles. | [`Op`], [`OpFn`], [`TaskHandle`] |
//! | **Fan-out** | Aggregate, capture, or race concurrent branches. | [`all`], [`parallel`], [`race`], [`race_map`] |
//! | **Supervision** | Restart-forever watchers with backoff. | [`supervise`], [`keep_alive`], [`take_every`], [`poll`], [`timer`] |
//! | **Fleet** | One watcher task per registration. | [`Visor`], [`WatchStrategy`], [`Config`] |
//!
//! ## Failure-policy cheat sheet
//! Branch failures travel differently per combinator, on purpose:
//! - [`all`] is **fail-fast**: the first error cancels the rest.
//! - [`parallel`] **never throws**: every branch settles to an
//!   [`OpResult`].
//! - [`race`] resolves on the first **success**; losing failures are
//!   captured, not raised.
//! - [`supervise`] **absorbs** failures into its backoff schedule and
//!   reports them on the bus.
//! - Cancellation is none of the above: a halted task resolves without
//!   raising.
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
//!         Pattern::from("cache:refresh"),
//!         WatchStrategy::Latest,
//!         Arc::new(HandlerFn::new(|action: Action| async move {
//!             // refetch, recompute, ...
//!             let _ = action;
//!             Ok::<_, opvisor::OpError>(())
//!         })),
//!     );
//!
//!     let bus = visor.bus().clone();
//!     let token = CancellationToken::new();
//!     let fleet = {
//!         let token = token.clone();
//!         tokio::spawn(async move { visor.run(token).await })
//!     };
//!
//!     bus.emit(Action::new("cache:refresh"));
//!     token.cancel();
//!     let results = fleet.await.unwrap();
//!     assert!(results.iter().all(|r| r.is_ok()));
//! }
//! ```

mod actions;
mod combine;
mod error;
mod pipeline;
mod supervise;
mod tasks;
mod visor;

// ---- Public re-exports ----

pub use actions::{Action, ActionCreator, Bus, BusCursor, Pattern};
pub use combine::{all, parallel, race, race_map, Parallel, RaceOutcome};
pub use error::{collect_results, OpError, OpResult};
pub use pipeline::{compose, BoxMdwFuture, MdwFn, Middleware, Next, Pipeline};
pub use supervise::{
    clear_timers, keep_alive, poll, supervise, take_every, take_latest, take_leading, timer,
    BackoffPolicy, JitterPolicy, CLEAR_TIMERS, SUPERVISE_ERROR, SUPERVISE_EXHAUSTED,
};
pub use tasks::{Op, OpFn, OpRef, TaskHandle};
pub use visor::{Config, Handler, HandlerFn, HandlerRef, Visor, WatchStrategy};
