//! Supervision combinators: self-healing watchers over the action bus.
//!
//! ## Contents
//! - [`BackoffPolicy`], [`JitterPolicy`] — restart delay schedule
//! - [`supervise`], [`keep_alive`] — restart-forever loops
//! - [`take_every`], [`take_latest`], [`take_leading`] — action-driven
//!   watcher strategies
//! - [`poll`] — trigger/cancel-bracketed periodic firing
//! - [`timer`], [`clear_timers`] — per-key debounce windows
//!
//! ## Quick wiring
//! ```text
//! keep_alive([w1, w2, ...], backoff, bus, token)
//!   └─► parallel ∘ supervise: each watcher loop is restarted with backoff
//!        when it fails, forever, until the token fires
//! ```
//!
//! Every watcher takes its [`Bus`](crate::Bus) and
//! [`CancellationToken`](tokio_util::sync::CancellationToken) explicitly;
//! there is no ambient context to misplace.

mod backoff;
mod jitter;
mod poll;
mod supervisor;
mod timer;
mod watch;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use poll::poll;
pub use supervisor::{keep_alive, supervise, SUPERVISE_ERROR, SUPERVISE_EXHAUSTED};
pub use timer::{clear_timers, timer, CLEAR_TIMERS};
pub use watch::{take_every, take_latest, take_leading};
