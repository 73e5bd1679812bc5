//! # Timeout decorator.
//!
//! [`Timeout`] bounds how long the caller waits for one run of the inner task.
//!
//! ## Race
//! ```text
//! run(ctx)
//!   ├─► child = ctx.child_token()          (outer cancellation still propagates)
//!   ├─► spawn(inner.run(child))
//!   └─► select (biased):
//!         ├─ inner finished  → its result, verbatim
//!         ├─ deadline        → publish TimeoutHit → Err(Timeout)
//!         └─ ctx cancelled   → Err(Canceled)
//!   on return: child.cancel()
//! ```
//!
//! ## Rules
//! - The inner run is **not** aborted when it loses the race. It keeps running in the
//!   background until it observes `child` cancellation or finishes on its own, and its
//!   result is discarded. Cancellation is cooperative: this decorator only stops
//!   *waiting*, it never stops *execution*.
//! - If the inner run finishes at the same instant the deadline fires, the result wins.
//! - A panic in the inner run surfaces as [`TaskError::Fatal`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinError;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::subscribers::{SubscriberSet, panic_message};
use crate::tasks::{Task, TaskRef};

/// Bounds each run of the inner task by `duration`.
pub struct Timeout {
    inner: TaskRef,
    duration: Duration,
    events: SubscriberSet,
}

impl Timeout {
    /// Wraps `inner` with a deadline of `duration`.
    pub fn new(inner: TaskRef, duration: Duration) -> Self {
        Self {
            inner,
            duration,
            events: SubscriberSet::empty(),
        }
    }

    /// Reports timeouts to `events`.
    pub fn with_subscribers(mut self, events: SubscriberSet) -> Self {
        self.events = events;
        self
    }

    /// Configured deadline.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[async_trait]
impl Task for Timeout {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        if ctx.is_cancelled() {
            return Err(TaskError::Canceled);
        }

        let child = ctx.child_token();
        let _cancel_child = child.clone().drop_guard();

        let inner = Arc::clone(&self.inner);
        let mut handle = tokio::spawn(async move { inner.run(child).await });

        let deadline = time::sleep(self.duration);
        tokio::pin!(deadline);

        select! {
            biased;
            joined = &mut handle => joined.unwrap_or_else(|e| Err(from_join_error(e))),
            _ = &mut deadline => {
                tracing::debug!(task = self.name(), timeout = ?self.duration, "deadline won the race");
                self.events.emit(
                    Event::new(EventKind::TimeoutHit)
                        .with_task(self.name())
                        .with_timeout(self.duration),
                );
                Err(TaskError::Timeout { timeout: self.duration })
            }
            _ = ctx.cancelled() => Err(TaskError::Canceled),
        }
    }
}

fn from_join_error(err: JoinError) -> TaskError {
    if err.is_panic() {
        let info = panic_message(&*err.into_panic());
        TaskError::fatal(format!("task panicked: {info}"))
    } else {
        TaskError::Canceled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::Instant;

    fn sleeper(ms: u64) -> TaskRef {
        TaskFn::arc("sleeper", move |_ctx: CancellationToken| async move {
            time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, TaskError>(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fast_task_result_is_returned() {
        let timeout = Timeout::new(sleeper(10), Duration::from_millis(50));
        let started = Instant::now();

        timeout.run(CancellationToken::new()).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_task_times_out_near_deadline() {
        let timeout = Timeout::new(sleeper(100), Duration::from_millis(50));
        let started = Instant::now();

        let err = timeout.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(
            err,
            TaskError::Timeout {
                timeout: Duration::from_millis(50)
            }
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn inner_error_passes_through() {
        let failing: TaskRef = TaskFn::arc("failing", |_ctx: CancellationToken| async {
            Err::<(), _>(TaskError::fail("own failure"))
        });
        let err = Timeout::new(failing, Duration::from_secs(1))
            .run(CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::fail("own failure"));
    }

    #[tokio::test(start_paused = true)]
    async fn outer_cancellation_wins_over_deadline() {
        let ctx = CancellationToken::new();
        let trigger = ctx.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = Timeout::new(sleeper(1_000), Duration::from_millis(500))
            .run(ctx)
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn loser_keeps_running_and_sees_cancellation() {
        let observed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed);
        let cooperative: TaskRef = TaskFn::arc("cooperative", move |ctx: CancellationToken| {
            let flag = Arc::clone(&flag);
            async move {
                ctx.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                Err::<(), _>(TaskError::Canceled)
            }
        });

        let err = Timeout::new(cooperative, Duration::from_millis(20))
            .run(CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Timeout { .. }));

        time::sleep(Duration::from_millis(1)).await;
        assert!(observed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panic_becomes_fatal() {
        let panicking: TaskRef = TaskFn::arc("panicking", |_ctx: CancellationToken| async {
            if true {
                panic!("exploded");
            }
            Ok::<_, TaskError>(())
        });
        let err = Timeout::new(panicking, Duration::from_secs(5))
            .run(CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::fatal("task panicked: exploded"));
    }

    #[tokio::test]
    async fn already_cancelled_context_returns_immediately() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let err = Timeout::new(sleeper(10), Duration::from_secs(1))
            .run(ctx)
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::Canceled);
    }
}
