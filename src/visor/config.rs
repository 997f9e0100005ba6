//! # Runtime configuration for a watcher fleet.
//!
//! [`Config`] centralizes the knobs a [`Visor`](super::Visor) hands to its
//! watchers: bus capacity, the restart backoff schedule, and the default
//! cadences for `poll` and `timer` registrations.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use opvisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.poll_interval = Duration::from_secs(30);
//!
//! assert_eq!(cfg.bus_capacity, 1024);
//! ```

use std::time::Duration;

use crate::supervise::BackoffPolicy;

/// Global configuration for a watcher fleet.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Capacity of the action bus ring buffer.
    pub bus_capacity: usize,
    /// Restart backoff applied to every supervised watcher.
    pub backoff: BackoffPolicy,
    /// Default period for `Poll` registrations.
    pub poll_interval: Duration,
    /// Default suppression window for `Timer` registrations.
    pub timer_window: Duration,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `bus_capacity = 1024`
    /// - `backoff = BackoffPolicy::default()` (20ms doubling, give up after 10)
    /// - `poll_interval = 5s`
    /// - `timer_window = 5min`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            backoff: BackoffPolicy::default(),
            poll_interval: Duration::from_secs(5),
            timer_window: Duration::from_secs(5 * 60),
        }
    }
}
