//! # Events emitted while tasks run.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Attempt events**: one invocation of a wrapped task (starting, failed, timeout, backoff)
//! - **Outcome events**: what a completion decorator observed (succeeded, failed)
//! - **Scheduler events**: periodic lifecycle and per-tick outcomes
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! reasons, and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered from several tasks.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskchain::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AttemptFailed)
//!     .with_task("demo-task")
//!     .with_reason("boom")
//!     .with_attempt(3)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::AttemptFailed);
//! assert_eq!(ev.task.as_deref(), Some("demo-task"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
///
/// Fields set per kind (`task` is always the task name, except for
/// `SubscriberPanicked` where it names the subscriber):
///
/// | Kind                 | `attempt`         | `reason`            | other        |
/// |----------------------|-------------------|---------------------|--------------|
/// | `AttemptStarting`    | attempt (1-based) |                     |              |
/// | `AttemptFailed`      | attempt           | error               |              |
/// | `BackoffScheduled`   | failed attempt    | error               | `delay_ms`   |
/// | `RetriesExhausted`   | attempts made     | last error          |              |
/// | `TimeoutHit`         |                   |                     | `timeout_ms` |
/// | `TaskSucceeded`      |                   |                     |              |
/// | `TaskFailed`         |                   | error               |              |
/// | `HookPanicked`       |                   | panic message       |              |
/// | `SchedulerStarted`   |                   | trigger             |              |
/// | `SchedulerStopped`   | ticks fired       |                     |              |
/// | `TickFired`          | tick (1-based)    |                     |              |
/// | `TickFailed`         | tick              | error or panic      |              |
/// | `SubscriberPanicked` |                   | panic message       |              |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // Retry / Timeout
    AttemptStarting,
    AttemptFailed,
    BackoffScheduled,
    /// All attempts were used up; the last error is returned.
    RetriesExhausted,
    /// The deadline won the race against the inner run.
    TimeoutHit,

    // Completion
    TaskSucceeded,
    TaskFailed,
    /// A completion hook panicked; the original result was still returned.
    HookPanicked,

    // PeriodicScheduler
    SchedulerStarted,
    SchedulerStopped,
    /// A trigger fired and a run was spawned.
    TickFired,
    /// A tick's run failed or panicked. Not surfaced anywhere else.
    TickFailed,

    // SubscriberSet
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Backoff delay before next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, trigger details, etc.).
    pub reason: Option<Arc<str>>,
    /// Attempt or tick count (starting from 1).
    pub attempt: Option<u32>,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            attempt: None,
            timeout_ms: None,
            reason: None,
            delay_ms: None,
            task: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
