//! # Actions carried on the bus.
//!
//! An [`Action`] is a named message: a `kind` plus optional metadata that the
//! supervision combinators understand (`key` for debounce windows, `keys` for
//! clearing them, `interval` for poll overrides) and an opaque, type-erased
//! payload for everything else.
//!
//! [`ActionCreator`] pairs a fixed `kind` with a constructor, so the same
//! value can both build actions and serve as a match pattern — the explicit
//! replacement for "stringable" action creators that are matched via their
//! string form.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use opvisor::Action;
//!
//! let action = Action::new("tick")
//!     .with_key("job-42")
//!     .with_interval(Duration::from_secs(5))
//!     .with_payload(7u32);
//!
//! assert_eq!(action.kind.as_ref(), "tick");
//! assert_eq!(action.key.as_deref(), Some("job-42"));
//! assert_eq!(action.payload_ref::<u32>(), Some(&7));
//! assert_eq!(action.payload_ref::<String>(), None);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A message published on the [`Bus`](crate::Bus).
///
/// Cheap to clone: every field is either `Copy` or behind an `Arc`.
#[derive(Clone)]
pub struct Action {
    /// Action type; what patterns match against.
    pub kind: Arc<str>,
    /// Debounce key, consumed by `timer`.
    pub key: Option<Arc<str>>,
    /// Keys targeted by a clear-timers action (`"*"` clears all).
    pub keys: Option<Vec<Arc<str>>>,
    /// Per-action interval override, consumed by `poll`.
    pub interval: Option<Duration>,
    /// Human-readable reason (supervision failure reports).
    pub reason: Option<Arc<str>>,
    /// Opaque payload; read back with [`Action::payload_ref`].
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Action {
    /// Creates an action of the given kind with no metadata.
    pub fn new(kind: impl Into<Arc<str>>) -> Self {
        Self {
            kind: kind.into(),
            key: None,
            keys: None,
            interval: None,
            reason: None,
            payload: None,
        }
    }

    /// Attaches a debounce key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches the set of keys a clear-timers action targets.
    #[inline]
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Attaches an interval override.
    #[inline]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an arbitrary payload value.
    #[inline]
    pub fn with_payload<P: Any + Send + Sync>(mut self, payload: P) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Borrows the payload as `P`, if one of that type is attached.
    pub fn payload_ref<P: Any>(&self) -> Option<&P> {
        self.payload.as_deref().and_then(|p| p.downcast_ref())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("keys", &self.keys)
            .field("interval", &self.interval)
            .field("reason", &self.reason)
            .field("payload", &self.payload.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Builds actions of one fixed kind.
///
/// Doubles as a pattern: `Pattern::from(creator)` matches every action the
/// creator produces.
///
/// ## Example
/// ```rust
/// use opvisor::{ActionCreator, Pattern};
///
/// let fetch_user = ActionCreator::new("user:fetch");
/// let action = fetch_user.make().with_key("user-1");
///
/// assert!(Pattern::from(&fetch_user).matches(&action));
/// ```
#[derive(Clone, Debug)]
pub struct ActionCreator {
    kind: Arc<str>,
}

impl ActionCreator {
    /// Creates an action creator for the given kind.
    pub fn new(kind: impl Into<Arc<str>>) -> Self {
        Self { kind: kind.into() }
    }

    /// Returns the kind every produced action carries.
    pub fn kind(&self) -> &Arc<str> {
        &self.kind
    }

    /// Builds a fresh action of this creator's kind.
    pub fn make(&self) -> Action {
        Action::new(self.kind.clone())
    }
}
