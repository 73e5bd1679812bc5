//! Retry policies.
//!
//! This module groups the knobs that control **whether** a failed attempt is
//! retried and **how long** to wait between attempts.
//!
//! ## Contents
//! - [`RetryPolicy`] max attempts + backoff + retry condition, validated on construction
//! - [`Backoff`] attempt index → delay (closures and [`BackoffPolicy`] implement it)
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization strategy to avoid thundering herd
//! - [`RetryCondition`] error → "retry this?" (closures, [`Always`], [`Retryable`])
//!
//! ## Quick wiring
//! ```text
//! RetryPolicy { max_attempts, backoff, condition }
//!      └─► decorators::Retry uses:
//!           - condition.should_retry(&err) to decide continue/return
//!           - backoff.delay(attempt) to schedule the next attempt
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=100ms, factor=1.0 (constant), max=30s, jitter=None.
//! - `JitterPolicy::None` by default; consider `Equal` for balanced randomness.

mod backoff;
mod jitter;
mod retry;

pub use backoff::{Backoff, BackoffPolicy};
pub use jitter::JitterPolicy;
pub use retry::{Always, RetryCondition, RetryPolicy, Retryable};
