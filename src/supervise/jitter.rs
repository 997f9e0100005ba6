//! # Jitter policy for restart delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that many watchers
//! restarting at once do not hammer their upstreams in lockstep.
//!
//! - [`JitterPolicy::None`] — no randomization, predictable delays
//! - [`JitterPolicy::Full`] — random delay in `[0, delay]`
//! - [`JitterPolicy::Equal`] — `delay/2 + random[0, delay/2]`

use std::time::Duration;

use rand::Rng;

/// Policy controlling randomization of restart delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// Use the exact backoff delay.
    #[default]
    None,
    /// Random delay in `[0, delay]`; most aggressive spreading.
    Full,
    /// `delay/2 + random[0, delay/2]`; keeps ~75% of the delay on average.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }
}

/// Full jitter: `random[0, delay]`.
fn full_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(0..=ms))
}

/// Equal jitter: `delay/2 + random[0, delay/2]`.
fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let jitter = if half == 0 {
        0
    } else {
        let mut rng = rand::rng();
        rng.random_range(0..=half)
    };
    Duration::from_millis(half + jitter)
}
