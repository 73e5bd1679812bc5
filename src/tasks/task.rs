//! # Task abstraction.
//!
//! Defines the [`Task`] trait (async, cancelable) and its shared handle [`TaskRef`].
//! Decorators and the periodic scheduler only ever see tasks through this trait, so
//! a decorated task is indistinguishable from a plain one.
//!
//! A task receives a [`CancellationToken`] and should periodically check it to
//! stop cooperatively. Nothing in this crate preempts a running task: cancellation
//! is a request, and the decorators only *stop waiting*, they never *stop execution*.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Shared handle to a task object.
///
/// This is the type decorators wrap and the scheduler invokes.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` has a stable [`name`](Task::name) and an async [`run`](Task::run) method that receives a [`CancellationToken`].
/// Each call to `run` is one independent invocation; tasks keep no state between invocations
/// unless the implementor deliberately holds it (e.g. behind an `Arc<Mutex<_>>`).
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use taskchain::{Task, TaskError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task once.
    ///
    /// Implementations should check `ctx.is_cancelled()` (or await `ctx.cancelled()`)
    /// and return [`TaskError::Canceled`] promptly once cancellation is requested.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
