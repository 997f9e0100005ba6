//! Watcher fleet runtime: registration surface over the combinators.
//!
//! ## Contents
//! - [`Config`] — bus capacity, backoff, poll/timer defaults
//! - [`Handler`], [`HandlerFn`], [`HandlerRef`] — action handlers
//! - [`Visor`], [`WatchStrategy`] — (pattern, handler) registrations bound
//!   to continuously-running watcher tasks

mod config;
mod registry;

pub use config::Config;
pub use registry::{Handler, HandlerFn, HandlerRef, Visor, WatchStrategy};
