//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging event handlers (loggers, metrics,
//! alerting) into decorators and schedulers.
//!
//! ## Contract
//! - `on_event` runs **synchronously** on the path that emitted the event
//!   (an attempt loop, a completion decorator, a trigger loop). Keep it cheap;
//!   hand heavy work to a channel or a spawned task.
//! - Subscribers are write-only sinks: nothing they do can change a task's result.
//! - A panic inside `on_event` is caught by [`SubscriberSet`](crate::SubscriberSet)
//!   and reported as [`EventKind::SubscriberPanicked`](crate::EventKind::SubscriberPanicked).

use crate::events::Event;

/// Contract for event subscribers.
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
