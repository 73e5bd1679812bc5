//! # Periodic execution.
//!
//! - [`Trigger`]: *when* to fire: a six-field cron expression (seconds granularity)
//!   or a fixed interval. Parsed and validated eagerly.
//! - [`PeriodicScheduler`]: *how* to fire: a background trigger loop that spawns one
//!   run of a composed task per tick, plus a watcher that stops the loop when the
//!   caller's context is cancelled.
//!
//! ## Lifecycle
//! ```text
//! Unstarted ──start(ctx)──► Running ──stop() / ctx cancelled / schedule ended──► Stopped
//!     └──────────────────────────stop()─────────────────────────────────────────────┘
//! ```
//! `Stopped` is terminal; restarting means building a new scheduler.

mod periodic;
mod trigger;

pub use periodic::{PeriodicScheduler, SchedulerState};
pub use trigger::Trigger;
