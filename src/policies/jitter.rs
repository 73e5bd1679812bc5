//! # Jitter for retry delays.
//!
//! [`JitterPolicy`] randomizes backoff delays so that many chains failing at the
//! same moment do not retry in lockstep.
//!
//! | Policy         | Delay for base `d`                    |
//! |----------------|---------------------------------------|
//! | `None`         | `d`                                   |
//! | `Full`         | random in `[0, d]`                    |
//! | `Equal`        | `d/2` + random in `[0, d/2]`          |
//! | `Decorrelated` | random in `[floor, 3·d]`, capped at max |
//!
//! Policies deserialize from snake_case names (`"none"`, `"full"`, `"equal"`,
//! `"decorrelated"`) so they can be set from a config file.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Policy controlling randomization of retry delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterPolicy {
    /// Use the exact backoff delay. Predictable; fine for a single chain or tests.
    #[default]
    None,
    /// Random delay in `[0, d]`. Spreads load the most, can shorten waits a lot.
    Full,
    /// `d/2` plus random in `[0, d/2]`. Keeps about three quarters of the delay on average.
    Equal,
    /// Random delay in `[floor, 3·d]` capped at `max`; grows independently per attempt.
    Decorrelated,
}

impl JitterPolicy {
    /// Applies the policy to the base delay `base`.
    ///
    /// `floor` and `max` are only consulted by [`JitterPolicy::Decorrelated`].
    pub fn apply(self, base: Duration, floor: Duration, max: Duration) -> Duration {
        let base_ms = millis(base);
        match self {
            JitterPolicy::None => base,
            JitterPolicy::Full => Duration::from_millis(random_upto(0, base_ms)),
            JitterPolicy::Equal => {
                let half = base_ms / 2;
                Duration::from_millis(half + random_upto(0, half))
            }
            JitterPolicy::Decorrelated => {
                let floor_ms = millis(floor);
                let upper = base_ms.saturating_mul(3).min(millis(max)).max(floor_ms);
                Duration::from_millis(random_upto(floor_ms, upper))
            }
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

/// Uniform value in `[low, high]`; returns `low` for an empty range.
fn random_upto(low: u64, high: u64) -> u64 {
    if high <= low {
        return low;
    }
    rand::rng().random_range(low..=high)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: Duration = Duration::from_millis(100);
    const MAX: Duration = Duration::from_secs(30);

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d, FLOOR, MAX), d);
    }

    #[test]
    fn full_stays_within_base() {
        let d = Duration::from_millis(1000);
        for _ in 0..100 {
            assert!(JitterPolicy::Full.apply(d, FLOOR, MAX) <= d);
        }
    }

    #[test]
    fn equal_keeps_at_least_half() {
        let d = Duration::from_millis(1000);
        for _ in 0..100 {
            let got = JitterPolicy::Equal.apply(d, FLOOR, MAX);
            assert!(got >= Duration::from_millis(500));
            assert!(got <= d);
        }
    }

    #[test]
    fn decorrelated_respects_floor_and_cap() {
        let d = Duration::from_secs(20);
        for _ in 0..100 {
            let got = JitterPolicy::Decorrelated.apply(d, FLOOR, MAX);
            assert!(got >= FLOOR);
            assert!(got <= MAX);
        }
    }

    #[test]
    fn zero_delay_stays_zero() {
        assert_eq!(
            JitterPolicy::Full.apply(Duration::ZERO, FLOOR, MAX),
            Duration::ZERO
        );
        assert_eq!(
            JitterPolicy::Equal.apply(Duration::ZERO, FLOOR, MAX),
            Duration::ZERO
        );
    }

    #[test]
    fn deserializes_from_snake_case() {
        let p: JitterPolicy = serde_json::from_str("\"decorrelated\"").unwrap();
        assert_eq!(p, JitterPolicy::Decorrelated);
    }
}
