//! Runtime events emitted by decorators and the periodic scheduler.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: [`Retry`](crate::Retry), [`Timeout`](crate::Timeout),
//!   [`Completion`](crate::Completion), [`PeriodicScheduler`](crate::PeriodicScheduler),
//!   and [`SubscriberSet`](crate::SubscriberSet) itself (subscriber panics).
//! - **Consumers**: any [`Subscribe`](crate::Subscribe) implementation injected
//!   through a [`SubscriberSet`](crate::SubscriberSet).

mod event;

pub use event::{Event, EventKind};
