//! Operations and task handles.
//!
//! This module provides the unit-of-work types everything else composes:
//! - [`Op`] — trait for an async, cancellable, re-runnable operation
//! - [`OpFn`] — function-backed operation
//! - [`OpRef`] — shared handle to an operation (`Arc<dyn Op<T>>`)
//! - [`TaskHandle`] — a spawned operation: awaitable, haltable

mod handle;
mod op;
mod op_fn;

pub use handle::TaskHandle;
pub use op::{Op, OpRef};
pub use op_fn::OpFn;
