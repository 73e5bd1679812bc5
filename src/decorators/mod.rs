//! # Task decorators.
//!
//! Each decorator holds an inner [`TaskRef`](crate::TaskRef), adds exactly one
//! behavior, and implements [`Task`](crate::Task) itself, so decorators nest freely:
//!
//! ```text
//! Completion ──► Retry ──► Timeout ──► base task
//!  (outermost)                          (innermost)
//! ```
//!
//! - [`Timeout`] races the inner run against a deadline and the caller's context
//! - [`Retry`] re-runs the inner task per a [`RetryPolicy`](crate::RetryPolicy)
//! - [`Completion`] calls success/failure hooks and returns the result unchanged
//!
//! Constructing a decorator never runs anything; execution only happens in `run`.
//! Every decorator reports through an injected [`SubscriberSet`](crate::SubscriberSet)
//! (empty by default).

mod completion;
mod retry;
mod timeout;

pub use completion::{Completion, CompletionHooks};
pub use retry::Retry;
pub use timeout::Timeout;
