//! # Completion decorator.
//!
//! [`Completion`] calls a success or failure hook after every run of the inner task
//! and returns the inner result unchanged.
//!
//! ## Rules
//! - Exactly one hook fires per run: `on_success()` on `Ok`, `on_failure(&err)` on `Err`.
//! - Hooks run synchronously on the caller's path, after the inner run returns.
//! - Missing hooks are no-ops.
//! - A panicking hook is caught and reported as [`EventKind::HookPanicked`]; the
//!   original result is still returned.
//!
//! ## Example
//! ```rust
//! use taskchain::CompletionHooks;
//!
//! let hooks = CompletionHooks::new()
//!     .on_success(|| println!("done"))
//!     .on_failure(|err| eprintln!("failed: {err}"));
//! assert!(hooks.has_success() && hooks.has_failure());
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::subscribers::{SubscriberSet, panic_message};
use crate::tasks::{Task, TaskRef};

type SuccessHook = Arc<dyn Fn() + Send + Sync>;
type FailureHook = Arc<dyn Fn(&TaskError) + Send + Sync>;

/// Optional success and failure callbacks.
#[derive(Clone, Default)]
pub struct CompletionHooks {
    on_success: Option<SuccessHook>,
    on_failure: Option<FailureHook>,
}

impl CompletionHooks {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook called after a successful run.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Sets the hook called with the error after a failed run.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&TaskError) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(f));
        self
    }

    pub fn has_success(&self) -> bool {
        self.on_success.is_some()
    }

    pub fn has_failure(&self) -> bool {
        self.on_failure.is_some()
    }
}

impl fmt::Debug for CompletionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHooks")
            .field("on_success", &self.has_success())
            .field("on_failure", &self.has_failure())
            .finish()
    }
}

/// Notifies hooks about the outcome of each inner run.
pub struct Completion {
    inner: TaskRef,
    hooks: CompletionHooks,
    events: SubscriberSet,
}

impl Completion {
    /// Wraps `inner` with `hooks`.
    pub fn new(inner: TaskRef, hooks: CompletionHooks) -> Self {
        Self {
            inner,
            hooks,
            events: SubscriberSet::empty(),
        }
    }

    /// Reports outcomes to `events`.
    pub fn with_subscribers(mut self, events: SubscriberSet) -> Self {
        self.events = events;
        self
    }

    fn guarded(&self, hook: impl FnOnce()) {
        if let Err(panic_err) = catch_unwind(AssertUnwindSafe(hook)) {
            let info = panic_message(&*panic_err);
            tracing::error!(task = self.name(), info = %info, "completion hook panicked");
            self.events.emit(
                Event::new(EventKind::HookPanicked)
                    .with_task(self.name())
                    .with_reason(info),
            );
        }
    }
}

#[async_trait]
impl Task for Completion {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let res = self.inner.run(ctx).await;

        match &res {
            Ok(()) => {
                self.events
                    .emit(Event::new(EventKind::TaskSucceeded).with_task(self.name()));
                if let Some(hook) = &self.hooks.on_success {
                    self.guarded(|| hook());
                }
            }
            Err(err) => {
                self.events.emit(
                    Event::new(EventKind::TaskFailed)
                        .with_task(self.name())
                        .with_reason(err.to_string()),
                );
                if let Some(hook) = &self.hooks.on_failure {
                    self.guarded(|| hook(err));
                }
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok_task() -> TaskRef {
        TaskFn::arc("ok", |_ctx: CancellationToken| async { Ok::<_, TaskError>(()) })
    }

    fn failing_task() -> TaskRef {
        TaskFn::arc("failing", |_ctx: CancellationToken| async {
            Err::<(), _>(TaskError::fail("bad"))
        })
    }

    fn counting_hooks(
        successes: &Arc<AtomicUsize>,
        failures: &Arc<Mutex<Vec<TaskError>>>,
    ) -> CompletionHooks {
        let s = Arc::clone(successes);
        let f = Arc::clone(failures);
        CompletionHooks::new()
            .on_success(move || {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .on_failure(move |err| f.lock().unwrap().push(err.clone()))
    }

    #[tokio::test]
    async fn success_calls_only_success_hook_once() {
        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(Mutex::new(Vec::new()));
        let task = Completion::new(ok_task(), counting_hooks(&successes, &failures));

        task.run(CancellationToken::new()).await.unwrap();

        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert!(failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_hook_sees_error_and_result_is_unchanged() {
        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(Mutex::new(Vec::new()));
        let task = Completion::new(failing_task(), counting_hooks(&successes, &failures));

        let err = task.run(CancellationToken::new()).await.unwrap_err();

        assert_eq!(err, TaskError::fail("bad"));
        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(*failures.lock().unwrap(), vec![TaskError::fail("bad")]);
    }

    #[tokio::test]
    async fn missing_hooks_are_noops() {
        let task = Completion::new(failing_task(), CompletionHooks::new());
        let err = task.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, TaskError::fail("bad"));
    }

    #[tokio::test]
    async fn panicking_hook_does_not_alter_result() {
        let hooks = CompletionHooks::new().on_success(|| panic!("hook blew up"));
        let task = Completion::new(ok_task(), hooks);
        task.run(CancellationToken::new()).await.unwrap();
    }
}
