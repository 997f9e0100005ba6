//! Error types shared by every combinator in the crate.
//!
//! A single enum, [`OpError`], covers the whole taxonomy:
//!
//! - **Protocol violations** ([`OpError::DoubleNext`]) — programmer errors in
//!   a pipeline stage, surfaced at the call site.
//! - **Operation failures** ([`OpError::Fail`], [`OpError::Fatal`]) — raised
//!   by user operations; `Fail` is retryable under supervision, `Fatal` is
//!   not.
//! - **Cancellation** ([`OpError::Canceled`]) — not a failure. It marks which
//!   exit path a halted task took; supervisors and `halt()` discard it.
//! - **Bus shutdown** ([`OpError::BusClosed`]) — a watcher was waiting on an
//!   action bus whose last sender went away.
//!
//! [`collect_results`] folds a batch of per-branch results into a single
//! first-error result, for callers that want `all`-style semantics after a
//! `parallel` run.

use thiserror::Error;

/// Result alias used across every operation and combinator.
pub type OpResult<T> = Result<T, OpError>;

/// # Errors produced by operations and combinators.
///
/// Cloneable so a single branch outcome can feed several observation streams
/// (see `parallel`).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    /// A pipeline stage invoked its continuation more than once.
    #[error("next() called multiple times (stage {index})")]
    DoubleNext {
        /// Index of the stage that was dispatched twice.
        index: usize,
    },

    /// Operation failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable failure; supervision gives up immediately.
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The operation was halted by its cancellation token.
    #[error("operation cancelled")]
    Canceled,

    /// The action bus closed while a watcher was waiting on it.
    #[error("action bus closed")]
    BusClosed,
}

impl OpError {
    /// Shorthand for a retryable [`OpError::Fail`].
    #[inline]
    pub fn fail(error: impl Into<String>) -> Self {
        OpError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for a non-retryable [`OpError::Fatal`].
    #[inline]
    pub fn fatal(error: impl Into<String>) -> Self {
        OpError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use opvisor::OpError;
    ///
    /// assert_eq!(OpError::fail("boom").as_label(), "op_failed");
    /// assert_eq!(OpError::Canceled.as_label(), "op_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OpError::DoubleNext { .. } => "op_double_next",
            OpError::Fail { .. } => "op_failed",
            OpError::Fatal { .. } => "op_fatal",
            OpError::Canceled => "op_canceled",
            OpError::BusClosed => "op_bus_closed",
        }
    }

    /// Indicates whether supervision should schedule another attempt.
    ///
    /// Only [`OpError::Fail`] qualifies: protocol violations and fatal errors
    /// would fail the same way again, and cancellation means the scope is
    /// going away.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OpError::Fail { .. })
    }

    /// Returns `true` for the cancellation marker.
    pub fn is_canceled(&self) -> bool {
        matches!(self, OpError::Canceled)
    }
}

/// Folds per-branch results into one result, keeping the first error.
///
/// On success the values come back in the same order as the input.
///
/// # Example
/// ```
/// use opvisor::{collect_results, OpError};
///
/// let ok = collect_results(vec![Ok(1), Ok(2)]);
/// assert_eq!(ok, Ok(vec![1, 2]));
///
/// let err = collect_results(vec![Ok(1), Err(OpError::fail("boom")), Ok(3)]);
/// assert_eq!(err, Err(OpError::fail("boom")));
/// ```
pub fn collect_results<T>(results: Vec<OpResult<T>>) -> OpResult<Vec<T>> {
    let mut agg = Vec::with_capacity(results.len());
    for result in results {
        agg.push(result?);
    }
    Ok(agg)
}
