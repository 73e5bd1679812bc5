//! # LogWriter: forwards events to `tracing`
//!
//! A subscriber that turns incoming [`Event`]s into structured `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Levels
//! - `debug`: attempt starting, tick fired
//! - `info`: success, scheduler started/stopped
//! - `warn`: attempt failed, backoff, timeout, tick failed
//! - `error`: task failed, retries exhausted, panics in hooks or subscribers
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use taskchain::{LogWriter, Subscribe, SubscriberSet};
//!
//! let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//! let sink = SubscriberSet::new(subs);
//! ```

use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::AttemptStarting => {
                debug!(task, attempt = e.attempt, "attempt starting");
            }
            EventKind::AttemptFailed => {
                warn!(task, attempt = e.attempt, err = reason, "attempt failed");
            }
            EventKind::BackoffScheduled => {
                warn!(
                    task,
                    delay_ms = e.delay_ms,
                    after_attempt = e.attempt,
                    err = reason,
                    "backoff scheduled"
                );
            }
            EventKind::RetriesExhausted => {
                error!(task, attempts = e.attempt, err = reason, "retries exhausted");
            }
            EventKind::TimeoutHit => {
                warn!(task, timeout_ms = e.timeout_ms, "timeout hit");
            }
            EventKind::TaskSucceeded => {
                info!(task, "task succeeded");
            }
            EventKind::TaskFailed => {
                error!(task, err = reason, "task failed");
            }
            EventKind::HookPanicked => {
                error!(task, info = reason, "completion hook panicked");
            }
            EventKind::SchedulerStarted => {
                info!(task, trigger = reason, "scheduler started");
            }
            EventKind::SchedulerStopped => {
                info!(task, ticks = e.attempt, "scheduler stopped");
            }
            EventKind::TickFired => {
                debug!(task, tick = e.attempt, "tick fired");
            }
            EventKind::TickFailed => {
                warn!(task, tick = e.attempt, err = reason, "tick failed");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = task, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
