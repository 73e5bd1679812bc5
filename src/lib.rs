//! # taskchain
//!
//! **Taskchain** layers resilience policies onto a cancellable async unit of work
//! without touching the work itself: per-attempt timeouts, conditional retry with
//! backoff, completion hooks, and periodic (cron or interval) execution.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                ┌──────────────────────────────┐
//!                │  TaskChain (immutable builder)│
//!                │  .timeout() .retry()          │
//!                │  .with_completion()           │
//!                └──────┬─────────────────┬──────┘
//!            run(ctx)   │                 │  run_with_cron(ctx, expr) / run_every
//!                       ▼                 ▼
//!    ┌─────────────────────────┐   ┌──────────────────────────────┐
//!    │ Completion              │   │ PeriodicScheduler            │
//!    │  └─ Retry               │◄──┤  trigger loop ─► spawn run   │
//!    │      └─ Timeout         │   │  watcher: ctx ─► stop        │
//!    │          └─ base Task   │   └──────────────────────────────┘
//!    └───────────┬─────────────┘
//!                │ emit(Event)
//!                ▼
//!         SubscriberSet ──► LogWriter / custom Subscribe impls
//! ```
//!
//! ### Cancellation
//! A single [`CancellationToken`](tokio_util::sync::CancellationToken) flows from the
//! caller through every decorator. Retry checks it before each attempt and while
//! backing off; Timeout hands the inner run a child token and stops waiting when the
//! parent fires; the scheduler stops its trigger loop when it fires. Cancellation is
//! cooperative: decorators stop *waiting*, tasks decide when to stop *working*.
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                              |
//! |-------------------|----------------------------------------------------------|-------------------------------------------------|
//! | **Tasks**         | Async cancellable units of work.                         | [`Task`], [`TaskFn`], [`TaskRef`]               |
//! | **Decorators**    | Timeout, retry and completion wrappers.                  | [`Timeout`], [`Retry`], [`Completion`]          |
//! | **Chain**         | Immutable builder that composes decorators.              | [`TaskChain`]                                   |
//! | **Policies**      | Backoff, jitter and retry conditions.                    | [`RetryPolicy`], [`BackoffPolicy`], [`JitterPolicy`] |
//! | **Scheduling**    | Cron or interval triggers with a start/stop lifecycle.   | [`PeriodicScheduler`], [`Trigger`]              |
//! | **Subscriber API**| Injected event sinks (logging, metrics, tests).          | [`Subscribe`], [`SubscriberSet`]                |
//! | **Errors**        | Typed errors for tasks, schedules and configuration.     | [`TaskError`], [`ScheduleError`], [`ConfigError`] |
//! | **Configuration** | TOML/JSON config mapped onto a chain.                    | [`Config`], [`FileLoader`]                      |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber forwarding events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskchain::{BackoffPolicy, CompletionHooks, Retryable, SubscriberSet, TaskChain, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskchain::Subscribe>> = vec![Arc::new(taskchain::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskchain::Subscribe>> = Vec::new();
//!
//!     let chain = TaskChain::from_fn("report", |ctx: CancellationToken| async move {
//!         if ctx.is_cancelled() {
//!             return Err(TaskError::Canceled);
//!         }
//!         Ok(())
//!     })
//!     .with_subscribers(SubscriberSet::new(subs))
//!     .timeout(Duration::from_secs(5))
//!     .retry(3, BackoffPolicy::default(), Retryable)?
//!     .with_completion(CompletionHooks::new().on_failure(|err| eprintln!("report failed: {err}")));
//!
//!     let ctx = CancellationToken::new();
//!     chain.run(ctx.clone()).await?;
//!
//!     chain.run_with_cron(ctx.clone(), "0 */5 * * * *")?;
//!     chain.stop_cron();
//!     Ok(())
//! }
//! ```
mod chain;
mod decorators;
mod error;
mod events;
mod policies;
mod schedule;
mod subscribers;
mod tasks;

pub mod config;

// ---- Public re-exports ----

pub use chain::TaskChain;
pub use config::{BackoffConfig, Config, FileLoader, RetryOn};
pub use decorators::{Completion, CompletionHooks, Retry, Timeout};
pub use error::{ConfigError, ScheduleError, TaskError};
pub use events::{Event, EventKind};
pub use policies::{Always, Backoff, BackoffPolicy, JitterPolicy, RetryCondition, RetryPolicy, Retryable};
pub use schedule::{PeriodicScheduler, SchedulerState, Trigger};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef};

// Optional: built-in subscriber forwarding events to `tracing`.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
