//! # Pipeline stage abstraction.
//!
//! A [`Middleware`] receives exclusive access to the pipeline context and a
//! [`Next`] continuation. Calling `next.run(ctx)` resumes the remainder of
//! the chain; not calling it short-circuits the chain (allowed); calling it
//! twice is a protocol violation surfaced as
//! [`OpError::DoubleNext`](crate::OpError::DoubleNext).
//!
//! [`MdwFn`] wraps a closure as a stage for callers that do not want a named
//! type. The closure returns a boxed future because its output borrows both
//! the context and the continuation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OpResult;

use super::compose::Next;

/// Future returned by a function-backed stage; borrows the stage's inputs.
pub type BoxMdwFuture<'a> = Pin<Box<dyn Future<Output = OpResult<()>> + Send + 'a>>;

/// One stage of a [`Pipeline`](super::Pipeline).
#[async_trait]
pub trait Middleware<Ctx>: Send + Sync
where
    Ctx: Send + 'static,
{
    /// Runs this stage.
    ///
    /// Mutations to `ctx` are visible to later stages and, after the
    /// pipeline completes, to the caller. A downstream failure surfaces as
    /// the `Err` of `next.run(ctx)`, so a stage may intercept it.
    async fn handle(&self, ctx: &mut Ctx, next: Next<'_, Ctx>) -> OpResult<()>;
}

/// Function-backed pipeline stage.
pub struct MdwFn<F> {
    f: F,
}

impl<F> MdwFn<F> {
    /// Wraps the function as a stage.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the function and returns it as a shared stage handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<Ctx, F> Middleware<Ctx> for MdwFn<F>
where
    Ctx: Send + 'static,
    F: for<'a> Fn(&'a mut Ctx, Next<'a, Ctx>) -> BoxMdwFuture<'a> + Send + Sync,
{
    async fn handle(&self, ctx: &mut Ctx, next: Next<'_, Ctx>) -> OpResult<()> {
        (self.f)(ctx, next).await
    }
}
