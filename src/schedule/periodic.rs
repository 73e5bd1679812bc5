//! # Periodic scheduler: runs one task per trigger tick.
//!
//! [`PeriodicScheduler`] owns two background tasks once started:
//!
//! ```text
//! start(ctx) ─┬─► trigger loop: wait next deadline ─► spawn task.run(ctx) ─► repeat
//!             │         ▲ exits on stop token
//!             └─► watcher: ctx.cancelled() ─► stop token
//! ```
//!
//! ## Rules
//! - Ticks are fire-and-forget: the loop never waits for a run to finish, so runs of
//!   a slow task may overlap.
//! - A failed or panicking run is reported as [`EventKind::TickFailed`] and does not
//!   stop the schedule.
//! - [`stop`](PeriodicScheduler::stop) is idempotent and safe before `start`.
//! - Dropping a running scheduler stops it.
//! - Runs already in flight are not aborted by `stop`; they observe the caller's
//!   context like any other run.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::ScheduleError;
use crate::events::{Event, EventKind};
use crate::schedule::trigger::{Cadence, Trigger};
use crate::subscribers::{SubscriberSet, panic_message};
use crate::tasks::TaskRef;

/// Observable lifecycle of a [`PeriodicScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Unstarted,
    Running,
    Stopped,
}

/// Fires a composed task on a [`Trigger`] until stopped.
pub struct PeriodicScheduler {
    task: TaskRef,
    trigger: Trigger,
    events: SubscriberSet,
    started: AtomicBool,
    stop: CancellationToken,
    ticks: Arc<AtomicU64>,
}

impl PeriodicScheduler {
    /// Creates an unstarted scheduler.
    pub fn new(task: TaskRef, trigger: Trigger) -> Self {
        Self {
            task,
            trigger,
            events: SubscriberSet::empty(),
            started: AtomicBool::new(false),
            stop: CancellationToken::new(),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reports lifecycle and tick events to `events`.
    pub fn with_subscribers(mut self, events: SubscriberSet) -> Self {
        self.events = events;
        self
    }

    /// Starts the trigger loop on the current Tokio runtime.
    ///
    /// Every tick runs the task with `ctx`; cancelling `ctx` stops the scheduler.
    ///
    /// # Errors
    /// - [`ScheduleError::Stopped`] if the scheduler was already stopped;
    /// - [`ScheduleError::AlreadyStarted`] on a second call;
    /// - [`ScheduleError::NoRuntime`] outside a Tokio runtime.
    pub fn start(&self, ctx: CancellationToken) -> Result<(), ScheduleError> {
        if self.stop.is_cancelled() {
            return Err(ScheduleError::Stopped);
        }
        let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ScheduleError::AlreadyStarted);
        }

        runtime.spawn(watch(ctx.clone(), self.stop.clone()));
        runtime.spawn(
            TriggerLoop {
                task: Arc::clone(&self.task),
                cadence: Cadence::new(&self.trigger),
                ctx,
                stop: self.stop.clone(),
                events: self.events.clone(),
                ticks: Arc::clone(&self.ticks),
            }
            .run(),
        );

        tracing::info!(task = self.task.name(), trigger = %self.trigger, "scheduler started");
        self.events.emit(
            Event::new(EventKind::SchedulerStarted)
                .with_task(self.task.name())
                .with_reason(self.trigger.to_string()),
        );
        Ok(())
    }

    /// Stops the trigger loop. Repeated calls are no-ops.
    pub fn stop(&self) {
        if !self.stop.is_cancelled() {
            tracing::debug!(task = self.task.name(), "scheduler stop requested");
        }
        self.stop.cancel();
    }

    pub fn state(&self) -> SchedulerState {
        if self.stop.is_cancelled() {
            SchedulerState::Stopped
        } else if self.started.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Unstarted
        }
    }

    /// Number of ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        if self.state() == SchedulerState::Running {
            tracing::debug!(task = self.task.name(), "scheduler dropped while running; stopping");
        }
        self.stop.cancel();
    }
}

async fn watch(ctx: CancellationToken, stop: CancellationToken) {
    select! {
        _ = ctx.cancelled() => {
            tracing::debug!("caller context cancelled; stopping scheduler");
            stop.cancel();
        }
        _ = stop.cancelled() => {}
    }
}

struct TriggerLoop {
    task: TaskRef,
    cadence: Cadence,
    ctx: CancellationToken,
    stop: CancellationToken,
    events: SubscriberSet,
    ticks: Arc<AtomicU64>,
}

impl TriggerLoop {
    async fn run(mut self) {
        loop {
            let Some(deadline) = self.cadence.next_deadline() else {
                tracing::info!(task = self.task.name(), "schedule has no further fire times");
                break;
            };

            select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = time::sleep_until(deadline) => {}
            }

            let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
            self.events.emit(
                Event::new(EventKind::TickFired)
                    .with_task(self.task.name())
                    .with_attempt(u32::try_from(tick).unwrap_or(u32::MAX)),
            );
            tokio::spawn(fire(
                Arc::clone(&self.task),
                self.ctx.clone(),
                self.events.clone(),
                tick,
            ));
        }

        self.stop.cancel();
        let ticks = self.ticks.load(Ordering::Relaxed);
        tracing::info!(task = self.task.name(), ticks, "scheduler stopped");
        self.events.emit(
            Event::new(EventKind::SchedulerStopped)
                .with_task(self.task.name())
                .with_attempt(u32::try_from(ticks).unwrap_or(u32::MAX)),
        );
    }
}

/// One tick's run; the outcome is reported, never propagated.
async fn fire(task: TaskRef, ctx: CancellationToken, events: SubscriberSet, tick: u64) {
    let reason = match AssertUnwindSafe(task.run(ctx)).catch_unwind().await {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err.to_string(),
        Err(panic_err) => format!("task panicked: {}", panic_message(&*panic_err)),
    };

    tracing::warn!(task = task.name(), tick, error = %reason, "scheduled run failed");
    events.emit(
        Event::new(EventKind::TickFailed)
            .with_task(task.name())
            .with_attempt(u32::try_from(tick).unwrap_or(u32::MAX))
            .with_reason(reason),
    );
}
