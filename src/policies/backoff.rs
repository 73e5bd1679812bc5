//! # Backoff between retry attempts.
//!
//! [`Backoff`] maps a 0-based attempt index to the delay that follows it. Any
//! `Fn(u32) -> Duration` closure is a `Backoff`, so ad-hoc schedules need no type.
//!
//! [`BackoffPolicy`] is the ready-made exponential implementation: the delay after
//! attempt `n` is `first × factor^n`, clamped to `max`, then jittered. The base is
//! derived from the attempt index alone, so jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskchain::{Backoff, BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//! // 100ms × 2^10 = 102.4s → capped at 10s
//! assert_eq!(backoff.next(10), Duration::from_secs(10));
//!
//! // Closures work too: linear 1s per attempt.
//! let linear = |attempt: u32| Duration::from_secs(u64::from(attempt));
//! assert_eq!(linear.delay(3), Duration::from_secs(3));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Maps an attempt index (0-based) to the delay before the next attempt.
pub trait Backoff: Send + Sync + 'static {
    /// Delay to wait after attempt `attempt` failed.
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration + Send + Sync + 'static,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Exponential backoff with cap and jitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended; `1.0` is constant).
    pub factor: f64,
    /// Randomization applied to the capped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 100ms`, `max = 30s`, `factor = 1.0`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay without jitter.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay after the given attempt (0-indexed).
    ///
    /// Non-finite, negative or over-the-cap intermediate values all resolve to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if secs.is_finite() && (0.0..=self.max.as_secs_f64()).contains(&secs) {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        };

        self.jitter.apply(base, self.first.min(self.max), self.max)
    }
}

impl Backoff for BackoffPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.next(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(first_ms: u64, max: Duration, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max,
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn grows_exponentially_until_cap() {
        let policy = exp(100, Duration::from_secs(1), 2.0);
        let delays: Vec<_> = (0..6).map(|n| policy.next(n).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
    }

    #[test]
    fn factor_one_is_constant() {
        let policy = exp(500, Duration::from_secs(30), 1.0);
        assert!((0..20).all(|n| policy.next(n) == Duration::from_millis(500)));
    }

    #[test]
    fn first_above_max_is_capped() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            ..exp(0, Duration::from_secs(5), 2.0)
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn overflow_resolves_to_max() {
        let policy = exp(100, Duration::from_secs(10), 2.0);
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn jitter_never_exceeds_base() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Full,
            ..exp(100, Duration::from_secs(30), 2.0)
        };
        for n in 0..12 {
            let base = Duration::from_millis(100 * 2u64.pow(n)).min(Duration::from_secs(30));
            assert!(policy.next(n) <= base);
        }
    }

    #[test]
    fn constant_helper() {
        let policy = BackoffPolicy::constant(Duration::from_millis(7));
        assert_eq!(policy.delay(0), Duration::from_millis(7));
        assert_eq!(policy.delay(9), Duration::from_millis(7));
    }

    #[test]
    fn closures_are_backoffs() {
        let linear = |n: u32| Duration::from_millis(u64::from(n) * 10);
        assert_eq!(linear.delay(0), Duration::ZERO);
        assert_eq!(linear.delay(4), Duration::from_millis(40));
    }
}
