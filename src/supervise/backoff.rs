//! # Backoff policy for restarting supervised operations.
//!
//! [`BackoffPolicy`] controls how restart delays grow after repeated
//! failures, and when to stop trying altogether. It is parameterized by:
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::max`] the maximum delay cap;
//! - [`BackoffPolicy::limit`] the attempt budget (`0` = unlimited).
//!
//! The delay for attempt `n` (1-based) is `first × factor^(n-1)`, clamped to
//! `max`, then jitter is applied. Because the base is derived purely from
//! the attempt number, jitter output never feeds back into later delays.
//! Once `n` exceeds `limit`, [`BackoffPolicy::delay`] returns `None` and the
//! supervised operation is not restarted again.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use opvisor::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//!
//! // Attempt 1 — the initial delay.
//! assert_eq!(backoff.delay(1), Some(Duration::from_millis(20)));
//! // Attempt 2 — doubled.
//! assert_eq!(backoff.delay(2), Some(Duration::from_millis(40)));
//! // Attempt 11 — past the budget: give up.
//! assert_eq!(backoff.delay(11), None);
//! ```

use std::time::Duration;

use super::jitter::JitterPolicy;

/// Restart backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first restart.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Attempt budget; delays stop (and supervision gives up) past this
    /// many consecutive failures. `0` means never give up.
    pub limit: u32,
    /// Jitter applied to the computed delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns the stock watcher policy:
    /// - `first = 20ms`, `factor = 2.0` (20ms, 40ms, 80ms, …);
    /// - `max = 30s`;
    /// - `limit = 10` consecutive failures, then give up;
    /// - no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(20),
            max: Duration::from_secs(30),
            factor: 2.0,
            limit: 10,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant-delay policy with the given attempt budget.
    pub fn constant(delay: Duration, limit: u32) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            limit,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay before restart attempt `attempt` (1-based).
    ///
    /// Returns `None` once the attempt budget is exhausted — the signal to
    /// stop supervising. Attempt `0` is treated as attempt `1`.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if self.limit != 0 && attempt > self.limit {
            return None;
        }

        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_secs = self.max.as_secs_f64();
        let raw = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !raw.is_finite() || raw < 0.0 || raw > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(raw)
        };
        Some(self.jitter.apply(base))
    }
}
