//! # Panic-isolated event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], a cheap-to-clone list of subscribers that
//! decorators and schedulers carry as their injected event sink.
//!
//! ## Rules
//! - **Per-subscriber FIFO**: events from one emitter arrive in emission order
//! - **Isolation**: a panicking subscriber does not affect others or the task
//! - **Empty is free**: with no subscribers `emit` does nothing
//!
//! ## Panic handling
//! Each delivery is wrapped in `catch_unwind`:
//! - Panic is caught and converted to a `SubscriberPanicked` event for the other subscribers
//! - `SubscriberPanicked` events that panic again are only logged, never re-published
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Fan-out coordinator for event subscribers.
#[derive(Clone, Default)]
pub struct SubscriberSet {
    subs: Arc<[Arc<dyn Subscribe>]>,
}

impl SubscriberSet {
    /// Creates a set from the given subscribers.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs: subs.into() }
    }

    /// Returns an empty set (no-op sink).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// Returns `true` when there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Delivers `event` to every subscriber in registration order.
    pub fn emit(&self, event: Event) {
        if self.subs.is_empty() {
            return;
        }

        for (idx, sub) in self.subs.iter().enumerate() {
            let delivered = catch_unwind(AssertUnwindSafe(|| sub.on_event(&event)));
            if let Err(panic_err) = delivered {
                let info = panic_message(&*panic_err);
                tracing::warn!(subscriber = sub.name(), info = %info, "subscriber panicked");
                if !event.is_subscriber_panic() {
                    self.emit_panic(idx, Event::subscriber_panicked(sub.name(), info));
                }
            }
        }
    }

    /// Reports a subscriber panic to every other subscriber.
    fn emit_panic(&self, skip: usize, event: Event) {
        for (idx, sub) in self.subs.iter().enumerate() {
            if idx == skip {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| sub.on_event(&event))).is_err() {
                tracing::warn!(
                    subscriber = sub.name(),
                    "subscriber panicked while handling a panic report"
                );
            }
        }
    }
}

impl FromIterator<Arc<dyn Subscribe>> for SubscriberSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Subscribe>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.subs.iter().map(|s| s.name()))
            .finish()
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
