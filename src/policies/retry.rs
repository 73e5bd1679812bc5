//! # Retry policy: how many attempts, how long between them, and which failures qualify.
//!
//! A [`RetryPolicy`] bundles:
//! - `max_attempts`: total attempts including the first (must be `>= 1`);
//! - a [`Backoff`]: delay after attempt `n` failed;
//! - a [`RetryCondition`]: whether a given failure deserves another attempt.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskchain::{BackoffPolicy, RetryPolicy, Retryable, TaskError};
//!
//! let policy = RetryPolicy::new(3, BackoffPolicy::default(), Retryable).unwrap();
//! assert_eq!(policy.max_attempts(), 3);
//! assert!(policy.should_retry(&TaskError::fail("flaky")));
//! assert!(!policy.should_retry(&TaskError::fatal("broken")));
//!
//! // Zero attempts is a misconfiguration, not a silent no-op.
//! assert!(RetryPolicy::new(0, |_n: u32| Duration::ZERO, Retryable).is_err());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, TaskError};
use crate::policies::backoff::Backoff;

/// Decides, per failure, whether another attempt should be made.
pub trait RetryCondition: Send + Sync + 'static {
    /// `true` means "retry this failure".
    fn should_retry(&self, err: &TaskError) -> bool;
}

impl<F> RetryCondition for F
where
    F: Fn(&TaskError) -> bool + Send + Sync + 'static,
{
    fn should_retry(&self, err: &TaskError) -> bool {
        self(err)
    }
}

/// Retries every failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl RetryCondition for Always {
    fn should_retry(&self, _err: &TaskError) -> bool {
        true
    }
}

/// Retries failures for which [`TaskError::is_retryable`] holds (`Fail`, `Timeout`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Retryable;

impl RetryCondition for Retryable {
    fn should_retry(&self, err: &TaskError) -> bool {
        err.is_retryable()
    }
}

/// Validated retry configuration. Cheap to clone.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
    condition: Arc<dyn RetryCondition>,
}

impl RetryPolicy {
    /// Creates a policy, rejecting `max_attempts == 0`.
    pub fn new(
        max_attempts: u32,
        backoff: impl Backoff,
        condition: impl RetryCondition,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                reason: "retry max_attempts must be at least 1".into(),
            });
        }
        Ok(Self {
            max_attempts,
            backoff: Arc::new(backoff),
            condition: Arc::new(condition),
        })
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after attempt `attempt` (0-based) failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Whether `err` qualifies for another attempt.
    pub fn should_retry(&self, err: &TaskError) -> bool {
        self.condition.should_retry(err)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_attempts() {
        let err = RetryPolicy::new(0, |_n: u32| Duration::ZERO, Always).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn closure_condition_is_consulted() {
        let only_specific =
            |err: &TaskError| matches!(err, TaskError::Fail { error } if error == "specific error");
        let policy = RetryPolicy::new(2, |_n: u32| Duration::ZERO, only_specific).unwrap();

        assert!(policy.should_retry(&TaskError::fail("specific error")));
        assert!(!policy.should_retry(&TaskError::fail("other")));
    }

    #[test]
    fn delay_comes_from_backoff() {
        let policy =
            RetryPolicy::new(5, |n: u32| Duration::from_secs(u64::from(n)), Always).unwrap();
        assert_eq!(policy.delay(0), Duration::ZERO);
        assert_eq!(policy.delay(2), Duration::from_secs(2));
    }

    #[test]
    fn builtin_conditions() {
        assert!(Always.should_retry(&TaskError::Canceled));
        assert!(Retryable.should_retry(&TaskError::Timeout {
            timeout: Duration::from_secs(1)
        }));
        assert!(!Retryable.should_retry(&TaskError::Canceled));
    }
}
