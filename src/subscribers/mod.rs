//! # Event subscribers.
//!
//! Logging and other observers are **injected**, never global: a chain or scheduler
//! is handed a [`SubscriberSet`] and every decorator built from it reports through
//! that set.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Retry / Timeout / Completion / PeriodicScheduler
//!        │
//!        └── emit(Event) ──► SubscriberSet ──┬──► sub1.on_event(&Event)
//!                            (synchronous,   ├──► sub2.on_event(&Event)
//!                             panic-isolated)└──► subN.on_event(&Event)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use taskchain::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! impl Subscribe for FailureCounter {
//!     fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::AttemptFailed {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
