//! Error types used by tasks, decorators, the periodic scheduler and config loading.
//!
//! This module defines three enums:
//!
//! - [`TaskError`]: errors returned by a task run (including the ones the decorators substitute).
//! - [`ScheduleError`]: errors raised when starting periodic execution.
//! - [`ConfigError`]: errors raised while loading or validating configuration.
//!
//! [`TaskError`] and [`ScheduleError`] provide `as_label` for logs/metrics, and
//! [`TaskError::is_retryable`] is what the [`Retryable`](crate::Retryable) condition consults.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by task execution.
///
/// The decorators propagate the innermost task's error unchanged and only substitute
/// their own kind when they are the cause:
/// - [`TaskError::Timeout`] when a [`Timeout`](crate::Timeout) deadline wins the race;
/// - [`TaskError::Canceled`] when the caller's context was cancelled.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution exceeded its timeout duration.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable fatal error (should not be retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task execution failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The caller's context was cancelled.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskchain::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`],
    /// `false` otherwise.
    ///
    /// # Example
    /// ```
    /// use taskchain::TaskError;
    ///
    /// assert!(TaskError::fail("boom").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// assert!(!TaskError::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }

    /// Returns `true` for [`TaskError::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

/// # Errors produced when starting periodic execution.
///
/// All of these are raised synchronously by the start call; nothing is
/// started when one is returned.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The cron expression could not be parsed.
    #[error("invalid cron expression {expr:?}: {source}")]
    Parse {
        /// The expression as given by the caller.
        expr: String,
        /// Parser error.
        #[source]
        source: cron::error::Error,
    },

    /// A fixed-interval trigger was given a zero interval.
    #[error("interval must be greater than zero")]
    InvalidInterval,

    /// `start` was called on a scheduler that is already running.
    #[error("scheduler already started")]
    AlreadyStarted,

    /// `start` was called on a scheduler that has been stopped (terminal state).
    #[error("scheduler stopped; create a new one to restart")]
    Stopped,

    /// Periodic execution requires a Tokio runtime in the calling context.
    #[error("no tokio runtime available to spawn the trigger loop")]
    NoRuntime,
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskchain::ScheduleError;
    ///
    /// assert_eq!(ScheduleError::InvalidInterval.as_label(), "schedule_invalid_interval");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::Parse { .. } => "schedule_parse",
            ScheduleError::InvalidInterval => "schedule_invalid_interval",
            ScheduleError::AlreadyStarted => "schedule_already_started",
            ScheduleError::Stopped => "schedule_stopped",
            ScheduleError::NoRuntime => "schedule_no_runtime",
        }
    }
}

/// # Errors produced while loading or validating configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML content did not deserialize into the target type.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON content did not deserialize into the target type.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension does not map to a supported format.
    #[error("unsupported config format for {path:?} (expected .toml or .json)")]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
    },

    /// A value is out of range or inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}
