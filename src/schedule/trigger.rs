//! # Trigger: when a periodic scheduler fires.
//!
//! Cron expressions have exactly six fields:
//!
//! ```text
//! sec  min  hour  day-of-month  month  day-of-week
//! ```
//!
//! Day-of-week uses the usual numbering: `0` (or `7`) is Sunday, `6` is Saturday;
//! names (`MON-FRI`) work too. The `@yearly`, `@monthly`, `@weekly`, `@daily` and
//! `@hourly` shorthands are accepted. Surrounding whitespace is ignored. Matching
//! itself is delegated to the [`cron`] crate.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskchain::Trigger;
//!
//! assert!(Trigger::cron("0 0 9 * * 1-5").is_ok());
//! assert!(Trigger::cron("not-a-cron").is_err());
//! assert!(Trigger::cron("0 0 0 1 1 * 2030").is_err());
//! assert!(Trigger::every(Duration::from_secs(1)).is_ok());
//! assert!(Trigger::every(Duration::ZERO).is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use cron::error::ErrorKind;
use tokio::time::Instant;

use crate::error::ScheduleError;

/// Fields in a cron expression: sec, min, hour, day-of-month, month, day-of-week.
const CRON_FIELDS: usize = 6;

/// Recurring trigger. Built only through [`Trigger::cron`] and [`Trigger::every`].
#[derive(Clone, Debug)]
pub struct Trigger {
    kind: Kind,
}

#[derive(Clone, Debug)]
enum Kind {
    Cron { expr: String, schedule: Box<Schedule> },
    /// Never zero.
    Every(Duration),
}

impl Trigger {
    /// Parses a six-field cron expression.
    ///
    /// Fails with [`ScheduleError::Parse`] on malformed input or a field count
    /// other than six.
    pub fn cron(expr: &str) -> Result<Self, ScheduleError> {
        let parse_err = |source: cron::error::Error| ScheduleError::Parse {
            expr: expr.to_string(),
            source,
        };
        let normalized = normalize(expr.trim()).map_err(|kind| parse_err(kind.into()))?;
        let schedule = Schedule::from_str(&normalized).map_err(parse_err)?;
        Ok(Self {
            kind: Kind::Cron {
                expr: expr.trim().to_string(),
                schedule: Box::new(schedule),
            },
        })
    }

    /// Fixed-interval trigger; the first tick fires one interval after start.
    ///
    /// Fails with [`ScheduleError::InvalidInterval`] for zero.
    pub fn every(interval: Duration) -> Result<Self, ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::InvalidInterval);
        }
        Ok(Self {
            kind: Kind::Every(interval),
        })
    }

    /// The interval, for interval triggers.
    pub fn interval(&self) -> Option<Duration> {
        match self.kind {
            Kind::Every(interval) => Some(interval),
            Kind::Cron { .. } => None,
        }
    }

    /// The expression as given, for cron triggers.
    pub fn expr(&self) -> Option<&str> {
        match &self.kind {
            Kind::Cron { expr, .. } => Some(expr),
            Kind::Every(_) => None,
        }
    }

    /// The first fire time strictly after `after`, or `None` if the schedule has ended.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.kind {
            Kind::Cron { schedule, .. } => schedule.after(&after).next(),
            Kind::Every(interval) => chrono::Duration::from_std(*interval)
                .ok()
                .and_then(|step| after.checked_add_signed(step)),
        }
    }
}

/// Checks the field count and rewrites day-of-week numbers for the parser,
/// which counts 1 = Sunday .. 7 = Saturday.
fn normalize(expr: &str) -> Result<String, ErrorKind> {
    if expr.starts_with('@') {
        return Ok(expr.to_string());
    }
    let mut fields: Vec<String> = expr.split_whitespace().map(str::to_string).collect();
    if fields.len() != CRON_FIELDS {
        return Err(ErrorKind::Expression(format!(
            "expected {CRON_FIELDS} fields (sec min hour dom month dow), found {}",
            fields.len()
        )));
    }
    if let Some(dow) = fields.last_mut() {
        *dow = dow.split(',').map(weekday_item).collect::<Vec<_>>().join(",");
    }
    Ok(fields.join(" "))
}

/// Maps one list item of the day-of-week field (`n`, `a-b`, `a-b/s`, `n/s`) from
/// 0/7 = Sunday numbering to an explicit list in the parser's numbering. Names,
/// wildcards and out-of-range values pass through for the parser to judge.
fn weekday_item(item: &str) -> String {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, step.parse::<usize>().ok().filter(|s| *s > 0)),
        None => (item, Some(1)),
    };
    let bounds = match base.split_once('-') {
        Some((lo, hi)) => lo.parse::<u8>().ok().zip(hi.parse::<u8>().ok()),
        None if item.contains('/') => base.parse::<u8>().ok().map(|lo| (lo, 6)),
        None => base.parse::<u8>().ok().map(|day| (day, day)),
    };

    match (bounds, step) {
        (Some((lo, hi)), Some(step)) if lo <= hi && hi <= 7 => {
            let mut days: Vec<u8> = (lo..=hi).step_by(step).map(|d| d % 7 + 1).collect();
            days.sort_unstable();
            days.dedup();
            days.iter().map(u8::to_string).collect::<Vec<_>>().join(",")
        }
        _ => item.to_string(),
    }
}

/// Turns a [`Trigger`] into successive monotonic deadlines for the trigger loop.
///
/// Intervals advance on the Tokio clock so they never drift; cron fire times are
/// computed on the wall clock and strictly increase, so one calendar slot never
/// fires twice.
pub(crate) enum Cadence {
    Every { period: Duration, next: Instant },
    Cron { trigger: Trigger, last: DateTime<Utc> },
}

impl Cadence {
    pub(crate) fn new(trigger: &Trigger) -> Self {
        match trigger.kind {
            Kind::Every(period) => Cadence::Every {
                period,
                next: Instant::now(),
            },
            Kind::Cron { .. } => Cadence::Cron {
                trigger: trigger.clone(),
                last: Utc::now(),
            },
        }
    }

    /// Next deadline, or `None` once a cron schedule has no more fire times.
    pub(crate) fn next_deadline(&mut self) -> Option<Instant> {
        match self {
            Cadence::Every { period, next } => {
                *next += *period;
                Some(*next)
            }
            Cadence::Cron { trigger, last } => {
                let now = Utc::now();
                let fire = trigger.next_after((*last).max(now))?;
                *last = fire;
                let wait = (fire - now).to_std().unwrap_or(Duration::ZERO);
                Some(Instant::now() + wait)
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Cron { expr, .. } => write!(f, "cron({expr})"),
            Kind::Every(interval) => write!(f, "every({interval:?})"),
        }
    }
}
