//! # Pipeline composition and dispatch.
//!
//! [`compose`] builds a [`Pipeline`] from an ordered stage list. Dispatch
//! walks the list by index, onion-style, with a single high-water mark
//! guarding against a stage resuming the chain twice.
//!
//! ## Rules
//! - Stages run in declaration order on the way in and reverse order on the
//!   way out.
//! - The high-water mark starts at -1 ("none dispatched"); dispatching index
//!   `i` raises it to `i`. A dispatch at or below the mark fails with
//!   [`OpError::DoubleNext`].
//! - List exhausted with a terminal continuation supplied → the terminal
//!   runs in the final slot. Exhausted without one → the pipeline ends
//!   silently.
//! - A stage's failure travels to the stage that invoked it, as the `Err`
//!   of `next.run(ctx)`; uncaught, it becomes the pipeline's result.

use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use crate::error::{OpError, OpResult};

use super::middleware::Middleware;

/// Builds a pipeline from an ordered stage list.
///
/// ## Example
/// ```rust
/// use async_trait::async_trait;
/// use std::sync::Arc;
/// use opvisor::{compose, Middleware, Next, OpResult};
///
/// struct Push(&'static str);
///
/// #[async_trait]
/// impl Middleware<Vec<&'static str>> for Push {
///     async fn handle(
///         &self,
///         ctx: &mut Vec<&'static str>,
///         next: Next<'_, Vec<&'static str>>,
///     ) -> OpResult<()> {
///         ctx.push(self.0);
///         next.run(ctx).await
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> OpResult<()> {
/// let chain: Vec<Arc<dyn Middleware<Vec<&'static str>>>> =
///     vec![Arc::new(Push("a")), Arc::new(Push("b"))];
/// let pipeline = compose(chain);
///
/// let mut ctx = Vec::new();
/// pipeline.run(&mut ctx).await?;
/// assert_eq!(ctx, ["a", "b"]);
/// # Ok(())
/// # }
/// ```
pub fn compose<Ctx>(chain: Vec<Arc<dyn Middleware<Ctx>>>) -> Pipeline<Ctx>
where
    Ctx: Send + 'static,
{
    Pipeline::new(chain)
}

/// Ordered middleware chain over a mutable context.
pub struct Pipeline<Ctx> {
    chain: Vec<Arc<dyn Middleware<Ctx>>>,
}

impl<Ctx: Send + 'static> Pipeline<Ctx> {
    /// Creates a pipeline from the given stages.
    pub fn new(chain: Vec<Arc<dyn Middleware<Ctx>>>) -> Self {
        Self { chain }
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` for a pipeline with no stages.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Runs the pipeline to completion over `ctx`.
    pub async fn run(&self, ctx: &mut Ctx) -> OpResult<()> {
        self.dispatch(ctx, None).await
    }

    /// Runs the pipeline with `terminal` occupying the final slot.
    ///
    /// The terminal only runs if every stage before it called `next`.
    pub async fn run_with(
        &self,
        ctx: &mut Ctx,
        terminal: Arc<dyn Middleware<Ctx>>,
    ) -> OpResult<()> {
        self.dispatch(ctx, Some(&terminal)).await
    }

    async fn dispatch(
        &self,
        ctx: &mut Ctx,
        terminal: Option<&Arc<dyn Middleware<Ctx>>>,
    ) -> OpResult<()> {
        let mark = AtomicIsize::new(-1);
        let next = Next {
            chain: &self.chain,
            terminal,
            index: 0,
            mark: &mark,
        };
        next.run(ctx).await
    }
}

/// Continuation resuming the remainder of a pipeline.
///
/// Handed to each stage; `run` may be awaited at most once per stage — a
/// second invocation trips the pipeline's high-water mark.
pub struct Next<'p, Ctx> {
    chain: &'p [Arc<dyn Middleware<Ctx>>],
    terminal: Option<&'p Arc<dyn Middleware<Ctx>>>,
    index: usize,
    mark: &'p AtomicIsize,
}

impl<'p, Ctx: Send + 'static> Next<'p, Ctx> {
    /// Resumes the remainder of the chain over `ctx`.
    pub async fn run(&self, ctx: &mut Ctx) -> OpResult<()> {
        let i = self.index as isize;
        if i <= self.mark.load(Ordering::SeqCst) {
            return Err(OpError::DoubleNext { index: self.index });
        }
        self.mark.store(i, Ordering::SeqCst);

        let stage = match self.chain.get(self.index) {
            Some(stage) => Some(stage),
            None if self.index == self.chain.len() => self.terminal,
            // past the terminal slot: the terminal's own `next` ends quietly
            None => None,
        };
        let stage = match stage {
            Some(stage) => stage,
            None => return Ok(()),
        };

        let next = Next {
            chain: self.chain,
            terminal: self.terminal,
            index: self.index + 1,
            mark: self.mark,
        };
        stage.handle(ctx, next).await
    }
}
