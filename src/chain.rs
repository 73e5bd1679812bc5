//! # Task chain builder.
//!
//! [`TaskChain`] holds a composed [`TaskRef`] and layers decorators onto it. Every
//! builder method takes `&self` and returns a **new** chain; the receiver keeps its
//! own task and stays usable.
//!
//! Decorator order is application order: the last decorator applied is outermost.
//!
//! ```text
//! TaskChain::from_fn(..)          base
//!     .timeout(50ms)              Timeout(base)
//!     .retry(3, backoff, cond)?   Retry(Timeout(base))        each attempt bounded
//!     .with_completion(hooks)     Completion(Retry(Timeout(base)))
//! ```
//!
//! ## Periodic execution
//! A chain owns at most one [`PeriodicScheduler`]. Starting a second schedule stops
//! the previous one before installing the new one; a start that fails (bad cron
//! expression, zero interval, no runtime) leaves the current schedule untouched.
//! [`stop_cron`](TaskChain::stop_cron) is idempotent. Dropping the chain stops its
//! schedule.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskchain::{BackoffPolicy, Retryable, TaskChain, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let chain = TaskChain::from_fn("ping", |_ctx: CancellationToken| async {
//!         Ok::<_, TaskError>(())
//!     })
//!     .timeout(Duration::from_millis(50))
//!     .retry(3, BackoffPolicy::default(), Retryable)?;
//!
//!     chain.run(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::decorators::{Completion, CompletionHooks, Retry, Timeout};
use crate::error::{ConfigError, ScheduleError, TaskError};
use crate::policies::{Backoff, RetryCondition, RetryPolicy};
use crate::schedule::{PeriodicScheduler, SchedulerState, Trigger};
use crate::subscribers::SubscriberSet;
use crate::tasks::{TaskFn, TaskRef};

/// Immutable decorator builder with an optional periodic schedule.
pub struct TaskChain {
    task: TaskRef,
    events: SubscriberSet,
    scheduler: Mutex<Option<PeriodicScheduler>>,
}

impl TaskChain {
    /// Starts a chain from an existing task.
    pub fn new(task: TaskRef) -> Self {
        Self {
            task,
            events: SubscriberSet::empty(),
            scheduler: Mutex::new(None),
        }
    }

    /// Starts a chain from a closure; see [`TaskFn`].
    pub fn from_fn<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self::new(TaskFn::arc(name, f))
    }

    /// Builds a chain from `cfg`: timeout first (if set), then retry (if
    /// `max_attempts > 1`).
    pub fn from_config(task: TaskRef, cfg: &Config) -> Result<Self, ConfigError> {
        Self::new(task).configure(cfg)
    }

    /// Applies `cfg` on top of this chain, keeping its subscribers.
    pub fn configure(&self, cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut chain = self.derive(Arc::clone(&self.task));
        if let Some(timeout) = cfg.default_timeout() {
            chain = chain.timeout(timeout);
        }
        if cfg.max_attempts > 1 {
            chain = chain.retry_policy(cfg.retry_policy()?);
        }
        Ok(chain)
    }

    /// Same task, different event sink for decorators applied from here on and for
    /// schedules started on the returned chain.
    pub fn with_subscribers(&self, events: SubscriberSet) -> Self {
        Self {
            task: Arc::clone(&self.task),
            events,
            scheduler: Mutex::new(None),
        }
    }

    /// Bounds each run by `duration`.
    pub fn timeout(&self, duration: Duration) -> Self {
        let timeout = Timeout::new(Arc::clone(&self.task), duration)
            .with_subscribers(self.events.clone());
        self.derive(Arc::new(timeout))
    }

    /// Retries up to `max_attempts` total attempts.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] when `max_attempts` is zero.
    pub fn retry(
        &self,
        max_attempts: u32,
        backoff: impl Backoff,
        condition: impl RetryCondition,
    ) -> Result<Self, ConfigError> {
        let policy = RetryPolicy::new(max_attempts, backoff, condition)?;
        Ok(self.retry_policy(policy))
    }

    pub fn retry_policy(&self, policy: RetryPolicy) -> Self {
        let retry =
            Retry::new(Arc::clone(&self.task), policy).with_subscribers(self.events.clone());
        self.derive(Arc::new(retry))
    }

    /// Calls `hooks` after every run.
    pub fn with_completion(&self, hooks: CompletionHooks) -> Self {
        let completion = Completion::new(Arc::clone(&self.task), hooks)
            .with_subscribers(self.events.clone());
        self.derive(Arc::new(completion))
    }

    /// The fully composed task.
    pub fn task(&self) -> TaskRef {
        Arc::clone(&self.task)
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Runs the composed task once.
    pub async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        self.task.run(ctx).await
    }

    /// Runs the composed task on a six-field cron schedule until stopped or until
    /// `ctx` is cancelled.
    ///
    /// # Errors
    /// [`ScheduleError::Parse`] for a malformed expression; nothing is started.
    ///
    /// # Drop
    /// The schedule lives as long as this chain. Calling this on a temporary
    /// (`TaskChain::from_fn(..).timeout(d).run_with_cron(ctx, expr)?`) stops the
    /// schedule at the end of the statement; bind the chain to a variable that
    /// outlives the schedule.
    pub fn run_with_cron(&self, ctx: CancellationToken, expr: &str) -> Result<(), ScheduleError> {
        self.run_on(ctx, Trigger::cron(expr)?)
    }

    /// Runs the composed task every `interval`.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidInterval`] for a zero interval.
    ///
    /// # Drop
    /// As with [`run_with_cron`](Self::run_with_cron), dropping the chain stops
    /// the schedule.
    pub fn run_every(&self, ctx: CancellationToken, interval: Duration) -> Result<(), ScheduleError> {
        self.run_on(ctx, Trigger::every(interval)?)
    }

    /// Runs the composed task on `trigger`, replacing any current schedule.
    /// Stops when the chain is dropped.
    pub fn run_on(&self, ctx: CancellationToken, trigger: Trigger) -> Result<(), ScheduleError> {
        let scheduler =
            PeriodicScheduler::new(Arc::clone(&self.task), trigger).with_subscribers(self.events.clone());

        let mut slot = self.slot();
        scheduler.start(ctx)?;
        if let Some(previous) = slot.take() {
            tracing::debug!(task = self.name(), "replacing active schedule");
            previous.stop();
        }
        *slot = Some(scheduler);
        Ok(())
    }

    /// Stops the current schedule, if any. Repeated calls are no-ops.
    pub fn stop_cron(&self) {
        if let Some(scheduler) = self.slot().take() {
            scheduler.stop();
        }
    }

    /// Whether a schedule is currently running.
    pub fn is_scheduled(&self) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|s| s.state() == SchedulerState::Running)
    }

    /// Ticks fired by the current schedule.
    pub fn ticks(&self) -> Option<u64> {
        self.slot().as_ref().map(PeriodicScheduler::ticks)
    }

    fn derive(&self, task: TaskRef) -> Self {
        Self {
            task,
            events: self.events.clone(),
            scheduler: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<PeriodicScheduler>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for TaskChain {
    /// Shares the composed task; the clone starts without a schedule.
    fn clone(&self) -> Self {
        self.derive(Arc::clone(&self.task))
    }
}

impl fmt::Debug for TaskChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskChain")
            .field("task", &self.name())
            .field("events", &self.events)
            .field("scheduled", &self.is_scheduled())
            .finish()
    }
}
