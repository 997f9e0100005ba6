//! Actions: the data model and transport for everything event-driven.
//!
//! This module groups the action **data model** and the **bus** that watchers
//! observe.
//!
//! ## Contents
//! - [`Action`], [`ActionCreator`] — action payload and metadata
//! - [`Pattern`] — predicate description used to match actions
//! - [`Bus`], [`BusCursor`] — broadcast transport with independent cursors
//!
//! ## Quick reference
//! - **Publishers**: anything holding a [`Bus`] clone (`emit`/`emit_all`),
//!   plus `supervise`, which reports watcher failures here.
//! - **Consumers**: `Bus::take` for one-shot waits, `BusCursor::next_match`
//!   inside watcher loops (`take_every`, `take_latest`, `take_leading`,
//!   `poll`, `timer`).

mod action;
mod bus;
mod pattern;

pub use action::{Action, ActionCreator};
pub use bus::{Bus, BusCursor};
pub use pattern::Pattern;
