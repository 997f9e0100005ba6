//! # First-success racing.
//!
//! [`race`] and [`race_map`] run every branch concurrently and settle on the
//! first branch to complete **successfully**. The remaining branches are
//! halted best-effort — their tokens are fired without waiting for them to
//! unwind.
//!
//! ## Rules
//! - A branch failure never wins and never unwinds the caller: positional
//!   [`race`] records it (and traces it) while the race continues; named
//!   [`race_map`] captures it in [`RaceOutcome::results`].
//! - If every branch fails, [`race`] returns the first-settled error and
//!   [`race_map`] returns `winner: None` with all failures captured.
//! - Only the winner's entry is guaranteed in [`RaceOutcome::results`];
//!   branches that settled before the winner are also present.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{OpError, OpResult};
use crate::tasks::OpRef;

/// Outcome of a named race.
#[derive(Debug)]
pub struct RaceOutcome<T> {
    /// Name of the first branch to settle successfully, if any did.
    pub winner: Option<Arc<str>>,
    /// Per-branch outcomes observed before the race settled.
    pub results: HashMap<Arc<str>, OpResult<T>>,
}

impl<T> RaceOutcome<T> {
    /// Borrows the winning branch's value.
    pub fn winning(&self) -> Option<&T> {
        let name = self.winner.as_ref()?;
        match self.results.get(name) {
            Some(Ok(value)) => Some(value),
            _ => None,
        }
    }
}

/// Spawns one branch; the settlement is reported over `tx` even when the
/// branch is cancelled, so the race loop always hears `n` settlements.
fn spawn_branch<T, K>(key: K, op: OpRef<T>, scope: &CancellationToken, tx: mpsc::UnboundedSender<(K, OpResult<T>)>) -> CancellationToken
where
    T: Send + 'static,
    K: Send + 'static,
{
    let token = scope.child_token();
    let branch = token.clone();
    tokio::spawn(async move {
        let inner = branch.clone();
        let fut = op.run(inner);
        let res = tokio::select! {
            biased;
            r = fut => r,
            _ = branch.cancelled() => Err(OpError::Canceled),
        };
        let _ = tx.send((key, res));
    });
    token
}

/// Races operations positionally; resolves with the first success.
pub async fn race<T>(ops: Vec<OpRef<T>>, parent: &CancellationToken) -> OpResult<T>
where
    T: Send + 'static,
{
    let scope = parent.child_token();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tokens: Vec<CancellationToken> = ops
        .into_iter()
        .enumerate()
        .map(|(i, op)| spawn_branch(i, op, &scope, tx.clone()))
        .collect();
    drop(tx);

    let mut first_err: Option<OpError> = None;
    while let Some((i, res)) = rx.recv().await {
        match res {
            Ok(value) => {
                for (j, token) in tokens.iter().enumerate() {
                    if j != i {
                        token.cancel();
                    }
                }
                return Ok(value);
            }
            Err(e) => {
                tracing::debug!(branch = i, error = %e, "race branch failed before a winner settled");
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.unwrap_or_else(|| OpError::fail("race over no operations")))
}

/// Races named operations; resolves once one settles successfully.
pub async fn race_map<T, K>(
    entries: Vec<(K, OpRef<T>)>,
    parent: &CancellationToken,
) -> RaceOutcome<T>
where
    T: Send + 'static,
    K: Into<Arc<str>>,
{
    let scope = parent.child_token();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tokens: HashMap<Arc<str>, CancellationToken> = entries
        .into_iter()
        .map(|(key, op)| {
            let key: Arc<str> = key.into();
            let token = spawn_branch(key.clone(), op, &scope, tx.clone());
            (key, token)
        })
        .collect();
    drop(tx);

    let mut outcome = RaceOutcome {
        winner: None,
        results: HashMap::new(),
    };
    while let Some((key, res)) = rx.recv().await {
        let won = res.is_ok();
        outcome.results.insert(key.clone(), res);
        if won {
            outcome.winner = Some(key);
            break;
        }
    }

    if let Some(winner) = &outcome.winner {
        for (key, token) in &tokens {
            if key != winner {
                token.cancel();
            }
        }
        // Branches that settled while the winner was being determined.
        while let Ok((key, res)) = rx.try_recv() {
            outcome.results.insert(key, res);
        }
    }
    outcome
}
