//! Fan-out/fan-in combinators.
//!
//! Three ways to run a batch of operations concurrently, differing in how
//! branch failures travel:
//!
//! | combinator | failure policy | result shape |
//! |---|---|---|
//! | [`all`] | fail-fast: first error cancels the rest | `OpResult<Vec<T>>`, input order |
//! | [`parallel`] | never throws: each branch captured | streams + `Vec<OpResult<T>>`, input order |
//! | [`race`] / [`race_map`] | first success wins, losers halted | winner value / [`RaceOutcome`] |

mod all;
mod parallel;
mod race;

pub use all::all;
pub use parallel::{parallel, Parallel};
pub use race::{race, race_map, RaceOutcome};
