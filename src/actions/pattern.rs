//! # Patterns: predicate descriptions over actions.
//!
//! A [`Pattern`] is pure data plus an exhaustive [`Pattern::matches`]; it is
//! re-evaluated per incoming action and holds no state.
//!
//! - [`Pattern::Wildcard`] matches every action (`"*"`).
//! - [`Pattern::Kind`] matches on the action's `kind` string.
//! - [`Pattern::Creator`] matches everything an [`ActionCreator`] produces.
//! - [`Pattern::Predicate`] defers to an arbitrary function.
//! - [`Pattern::AnyOf`] OR-composes sub-patterns, recursively.
//!
//! ## Example
//! ```rust
//! use opvisor::{Action, Pattern};
//!
//! let p = Pattern::any_of([
//!     Pattern::from("user:add"),
//!     Pattern::predicate(|a: &Action| a.key.is_some()),
//! ]);
//!
//! assert!(p.matches(&Action::new("user:add")));
//! assert!(p.matches(&Action::new("other").with_key("k")));
//! assert!(!p.matches(&Action::new("other")));
//! ```

use std::fmt;
use std::sync::Arc;

use super::action::{Action, ActionCreator};

/// Predicate description used to match actions on the bus.
#[derive(Clone)]
pub enum Pattern {
    /// Matches every action.
    Wildcard,
    /// Matches actions whose `kind` equals the given string.
    Kind(Arc<str>),
    /// Matches every action the referenced creator produces.
    Creator(ActionCreator),
    /// Matches actions the function returns `true` for.
    Predicate(Arc<dyn Fn(&Action) -> bool + Send + Sync>),
    /// Matches if any sub-pattern matches (OR semantics).
    AnyOf(Vec<Pattern>),
}

impl Pattern {
    /// Builds a predicate pattern from a function.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Action) -> bool + Send + Sync + 'static,
    {
        Pattern::Predicate(Arc::new(f))
    }

    /// OR-composes the given patterns.
    pub fn any_of<I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = Pattern>,
    {
        Pattern::AnyOf(patterns.into_iter().collect())
    }

    /// Evaluates the pattern against one action.
    ///
    /// An empty [`Pattern::AnyOf`] matches nothing.
    pub fn matches(&self, action: &Action) -> bool {
        match self {
            Pattern::Wildcard => true,
            Pattern::Kind(kind) => kind.as_ref() == action.kind.as_ref(),
            Pattern::Creator(creator) => creator.kind().as_ref() == action.kind.as_ref(),
            Pattern::Predicate(f) => f(action),
            Pattern::AnyOf(subs) => subs.iter().any(|p| p.matches(action)),
        }
    }
}

impl From<&str> for Pattern {
    /// `"*"` becomes [`Pattern::Wildcard`]; anything else a [`Pattern::Kind`].
    fn from(kind: &str) -> Self {
        if kind == "*" {
            Pattern::Wildcard
        } else {
            Pattern::Kind(Arc::from(kind))
        }
    }
}

impl From<&ActionCreator> for Pattern {
    fn from(creator: &ActionCreator) -> Self {
        Pattern::Creator(creator.clone())
    }
}

impl From<Vec<Pattern>> for Pattern {
    fn from(patterns: Vec<Pattern>) -> Self {
        Pattern::AnyOf(patterns)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard => write!(f, "Wildcard"),
            Pattern::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Pattern::Creator(creator) => f.debug_tuple("Creator").field(creator.kind()).finish(),
            Pattern::Predicate(_) => write!(f, "Predicate(..)"),
            Pattern::AnyOf(subs) => f.debug_tuple("AnyOf").field(subs).finish(),
        }
    }
}
