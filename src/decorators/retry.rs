//! # Retry decorator.
//!
//! [`Retry`] re-runs the inner task according to a [`RetryPolicy`].
//!
//! ## Attempt loop
//! ```text
//! loop {
//!   ├─► ctx cancelled?            → Err(Canceled)   (no attempt, no sleep)
//!   ├─► publish AttemptStarting{attempt}
//!   ├─► inner.run(ctx)
//!   │     ├─ Ok                   → Ok(())
//!   │     └─ Err(e) → publish AttemptFailed
//!   │          ├─ ctx cancelled    → Err(Canceled)  (no condition, no backoff)
//!   │          ├─ !should_retry(e) → Err(e)
//!   │          ├─ last attempt     → publish RetriesExhausted → Err(e)
//!   │          └─ publish BackoffScheduled
//!   │             sleep(backoff(attempt)) or ctx cancelled → Err(Canceled)
//! }
//! ```
//!
//! ## Rules
//! - Attempts run **strictly sequentially**; two attempts of one run never overlap.
//! - The inner task's error is returned unchanged; this decorator only substitutes
//!   [`TaskError::Canceled`] when the caller's context is the reason it stops.
//! - The backoff sleep is interruptible by cancellation.
//! - No sleep follows the final attempt.

use async_trait::async_trait;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::policies::RetryPolicy;
use crate::subscribers::SubscriberSet;
use crate::tasks::{Task, TaskRef};

/// Re-runs the inner task on qualifying failures.
pub struct Retry {
    inner: TaskRef,
    policy: RetryPolicy,
    events: SubscriberSet,
}

impl Retry {
    /// Wraps `inner` with `policy`.
    pub fn new(inner: TaskRef, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            events: SubscriberSet::empty(),
        }
    }

    /// Reports attempts and backoffs to `events`.
    pub fn with_subscribers(mut self, events: SubscriberSet) -> Self {
        self.events = events;
        self
    }

    /// The policy driving this decorator.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn event(&self, kind: EventKind, attempt: u32) -> Event {
        Event::new(kind)
            .with_task(self.name())
            .with_attempt(attempt)
    }
}

#[async_trait]
impl Task for Retry {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let max = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }

            attempt += 1;
            self.events
                .emit(self.event(EventKind::AttemptStarting, attempt));

            let err = match self.inner.run(ctx.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            self.events.emit(
                self.event(EventKind::AttemptFailed, attempt)
                    .with_reason(err.to_string()),
            );
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }

            if !self.policy.should_retry(&err) {
                return Err(err);
            }
            if attempt >= max {
                tracing::debug!(task = self.name(), attempts = attempt, error = %err, "retries exhausted");
                self.events.emit(
                    self.event(EventKind::RetriesExhausted, attempt)
                        .with_reason(err.to_string()),
                );
                return Err(err);
            }

            let delay = self.policy.delay(attempt - 1);
            self.events.emit(
                self.event(EventKind::BackoffScheduled, attempt)
                    .with_delay(delay)
                    .with_reason(err.to_string()),
            );

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{Always, BackoffPolicy, Retryable};
    use crate::subscribers::Subscribe;
    use crate::tasks::TaskFn;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Task failing with `err` for the first `failures` runs, then succeeding.
    fn flaky(calls: Arc<AtomicU32>, failures: u32, err: TaskError) -> TaskRef {
        TaskFn::arc("flaky", move |_ctx: CancellationToken| {
            let calls = Arc::clone(&calls);
            let err = err.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= failures { Err(err) } else { Ok(()) }
            }
        })
    }

    fn millis(ms: u64) -> impl Fn(u32) -> Duration + Send + Sync + 'static {
        move |_n| Duration::from_millis(ms)
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_task_runs_exactly_max_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls.clone(), u32::MAX, TaskError::fail("nope"));
        let retry = Retry::new(task, RetryPolicy::new(3, millis(1), Always).unwrap());

        let err = retry.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, TaskError::fail("nope"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls.clone(), 2, TaskError::fail("transient"));
        let retry = Retry::new(task, RetryPolicy::new(5, millis(1), Always).unwrap());

        retry.run(CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_failure_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls.clone(), u32::MAX, TaskError::fatal("broken"));
        let retry = Retry::new(task, RetryPolicy::new(5, millis(1), Retryable).unwrap());

        let err = retry.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, TaskError::fatal("broken"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_attempt_never_runs_task() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls.clone(), 0, TaskError::fail("unused"));
        let retry = Retry::new(task, RetryPolicy::new(3, millis(1), Always).unwrap());

        let ctx = CancellationToken::new();
        ctx.cancel();
        let err = retry.run(ctx).await.unwrap_err();
        assert_eq!(err, TaskError::Canceled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls.clone(), u32::MAX, TaskError::fail("down"));
        let retry = Retry::new(task, RetryPolicy::new(10, millis(60_000), Always).unwrap());

        let ctx = CancellationToken::new();
        let trigger = ctx.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = retry.run(ctx).await.unwrap_err();
        assert_eq!(err, TaskError::Canceled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_attempt_skips_condition_and_backoff() {
        #[derive(Default)]
        struct Kinds(Mutex<Vec<EventKind>>);
        impl Subscribe for Kinds {
            fn on_event(&self, event: &Event) {
                self.0.lock().unwrap().push(event.kind);
            }
        }

        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        let task = TaskFn::arc("cancels-then-fails", move |_ctx: CancellationToken| {
            let canceller = canceller.clone();
            async move {
                canceller.cancel();
                Err::<(), _>(TaskError::fail("mid-flight"))
            }
        });

        let backoff_calls = Arc::new(AtomicU32::new(0));
        let condition_calls = Arc::new(AtomicU32::new(0));
        let (b, c) = (Arc::clone(&backoff_calls), Arc::clone(&condition_calls));
        let policy = RetryPolicy::new(
            5,
            move |_n: u32| {
                b.fetch_add(1, Ordering::SeqCst);
                Duration::from_millis(1)
            },
            move |_e: &TaskError| {
                c.fetch_add(1, Ordering::SeqCst);
                true
            },
        )
        .unwrap();

        let kinds = Arc::new(Kinds::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![kinds.clone()];
        let retry = Retry::new(task, policy).with_subscribers(SubscriberSet::new(subs));

        let err = retry.run(ctx).await.unwrap_err();
        assert_eq!(err, TaskError::Canceled);
        assert_eq!(backoff_calls.load(Ordering::SeqCst), 0);
        assert_eq!(condition_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            *kinds.0.lock().unwrap(),
            vec![EventKind::AttemptStarting, EventKind::AttemptFailed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_receives_zero_based_attempt_index() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let backoff = move |n: u32| {
            record.lock().unwrap().push(n);
            Duration::from_millis(1)
        };
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls, u32::MAX, TaskError::fail("x"));
        let retry = Retry::new(task, RetryPolicy::new(4, backoff, Always).unwrap());

        let _ = retry.run(CancellationToken::new()).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_backoff_total_wait() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls, 3, TaskError::fail("x"));
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
            ..BackoffPolicy::default()
        };
        let retry = Retry::new(task, RetryPolicy::new(4, policy, Always).unwrap());

        let started = Instant::now();
        retry.run(CancellationToken::new()).await.unwrap();
        // 100 + 200 + 400
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(700));
        assert!(elapsed < Duration::from_millis(720));
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_attempt_events() {
        #[derive(Default)]
        struct Kinds(Mutex<Vec<EventKind>>);
        impl Subscribe for Kinds {
            fn on_event(&self, event: &Event) {
                self.0.lock().unwrap().push(event.kind);
            }
        }

        let kinds = Arc::new(Kinds::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![kinds.clone()];
        let calls = Arc::new(AtomicU32::new(0));
        let task = flaky(calls, u32::MAX, TaskError::fail("x"));
        let retry = Retry::new(task, RetryPolicy::new(2, millis(1), Always).unwrap())
            .with_subscribers(SubscriberSet::new(subs));

        let _ = retry.run(CancellationToken::new()).await;
        assert_eq!(
            *kinds.0.lock().unwrap(),
            vec![
                EventKind::AttemptStarting,
                EventKind::AttemptFailed,
                EventKind::BackoffScheduled,
                EventKind::AttemptStarting,
                EventKind::AttemptFailed,
                EventKind::RetriesExhausted,
            ]
        );
    }
}
