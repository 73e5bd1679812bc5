//! # Chain configuration and file loading.
//!
//! [`Config`] describes the resilience policies of one chain: default timeout,
//! retry attempts, backoff shape and an optional cron schedule. It deserializes
//! from TOML or JSON; every field has a default, so a file only lists what it
//! changes.
//!
//! [`FileLoader`] is a small generic collaborator: it reads any
//! [`DeserializeOwned`] type from a file, picking the format by extension.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use taskchain::{Config, JitterPolicy};
//!
//! let cfg: Config = toml::from_str(r#"
//!     timeout_ms = 500
//!     max_attempts = 3
//!
//!     [backoff]
//!     first_ms = 100
//!     factor = 2.0
//!     jitter = "equal"
//! "#).unwrap();
//!
//! assert_eq!(cfg.default_timeout(), Some(Duration::from_millis(500)));
//! assert_eq!(cfg.backoff_policy().jitter, JitterPolicy::Equal);
//! assert!(cfg.validate().is_ok());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::policies::{Always, BackoffPolicy, JitterPolicy, RetryPolicy, Retryable};
use crate::schedule::Trigger;

/// Policies applied by [`TaskChain::from_config`](crate::TaskChain::from_config).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Per-attempt timeout in milliseconds (0 = no timeout).
    pub timeout_ms: u64,
    /// Total attempts including the first (1 = no retry).
    pub max_attempts: u32,
    /// Which failures qualify for another attempt.
    pub retry_on: RetryOn,
    /// Delay between attempts.
    pub backoff: BackoffConfig,
    /// Optional six-field cron expression for periodic runs.
    pub schedule: Option<String>,
}

impl Default for Config {
    /// No timeout, a single attempt, default backoff, no schedule.
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            max_attempts: 1,
            retry_on: RetryOn::default(),
            backoff: BackoffConfig::default(),
            schedule: None,
        }
    }
}

/// Serializable retry condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    /// Every failure.
    Always,
    /// `Fail` and `Timeout` only.
    #[default]
    Retryable,
}

/// Serializable form of [`BackoffPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffConfig {
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
    pub jitter: JitterPolicy,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        let policy = BackoffPolicy::default();
        Self {
            first_ms: policy.first.as_millis() as u64,
            max_ms: policy.max.as_millis() as u64,
            factor: policy.factor,
            jitter: policy.jitter,
        }
    }
}

impl Config {
    /// Loads a config file and validates it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let cfg: Config = load(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Timeout to apply to each attempt, if any.
    pub fn default_timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(self.backoff.first_ms),
            max: Duration::from_millis(self.backoff.max_ms),
            factor: self.backoff.factor,
            jitter: self.backoff.jitter,
        }
    }

    /// Retry policy built from `max_attempts`, `retry_on` and `backoff`.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let backoff = self.backoff_policy();
        match self.retry_on {
            RetryOn::Always => RetryPolicy::new(self.max_attempts, backoff, Always),
            RetryOn::Retryable => RetryPolicy::new(self.max_attempts, backoff, Retryable),
        }
    }

    /// Parsed `schedule`, if set.
    pub fn trigger(&self) -> Result<Option<Trigger>, ConfigError> {
        self.schedule
            .as_deref()
            .map(|expr| {
                Trigger::cron(expr).map_err(|e| ConfigError::Invalid {
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Checks value ranges and the schedule expression.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts must be at least 1"));
        }
        if !self.backoff.factor.is_finite() || self.backoff.factor <= 0.0 {
            return Err(invalid("backoff.factor must be a positive finite number"));
        }
        if self.backoff.max_ms < self.backoff.first_ms {
            return Err(invalid("backoff.max_ms must not be below backoff.first_ms"));
        }
        self.trigger()?;
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

/// Reads typed configuration from a `.toml` or `.json` file.
#[derive(Clone, Debug)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and deserializes the file.
    ///
    /// The extension is checked before any I/O happens.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let format = self.format()?;
        let text = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), ?format, "loading config");

        match format {
            Format::Toml => Ok(toml::from_str(&text)?),
            Format::Json => Ok(serde_json::from_str(&text)?),
        }
    }

    fn format(&self) -> Result<Format, ConfigError> {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            _ => Err(ConfigError::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }
}

/// Shorthand for `FileLoader::new(path).load()`.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    FileLoader::new(path.as_ref()).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_mean_no_timeout_and_no_retry() {
        let cfg = Config::default();
        assert_eq!(cfg.default_timeout(), None);
        assert_eq!(cfg.max_attempts, 1);
        assert_eq!(cfg.backoff_policy(), BackoffPolicy::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "chain.toml",
            r#"
                timeout_ms = 250
                max_attempts = 4
                retry_on = "always"
                schedule = "*/10 * * * * *"

                [backoff]
                first_ms = 50
                max_ms = 1000
                factor = 2.0
                jitter = "full"
            "#,
        );

        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.default_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.retry_on, RetryOn::Always);
        assert_eq!(cfg.retry_policy().unwrap().max_attempts(), 4);
        assert_eq!(cfg.backoff_policy().first, Duration::from_millis(50));
        assert_eq!(cfg.backoff_policy().jitter, JitterPolicy::Full);
        assert!(cfg.trigger().unwrap().is_some());
    }

    #[test]
    fn loads_json_file_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "chain.JSON", r#"{ "max_attempts": 2 }"#);

        let cfg: Config = FileLoader::new(&path).load().unwrap();
        assert_eq!(cfg.max_attempts, 2);
        assert_eq!(cfg.timeout_ms, 0);
        assert_eq!(cfg.schedule, None);
    }

    #[test]
    fn loader_is_generic_over_target_type() {
        #[derive(Deserialize)]
        struct Other {
            name: String,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "other.toml", "name = \"nightly\"");
        let other: Other = load(&path).unwrap();
        assert_eq!(other.name, "nightly");
    }

    #[test]
    fn unknown_extension_is_rejected_before_reading() {
        let err = load::<Config>("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load::<Config>("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { ref path, .. } if path.ends_with("exist.toml")));
    }

    #[test]
    fn malformed_content_maps_to_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = write_file(&dir, "bad.toml", "max_attempts = \"three\"");
        let json_path = write_file(&dir, "bad.json", "{ not json");

        assert!(matches!(load::<Config>(&toml_path), Err(ConfigError::Toml(_))));
        assert!(matches!(load::<Config>(&json_path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<Config, _> = toml::from_str("retries = 3");
        assert!(res.is_err());
    }

    #[test]
    fn validation_catches_bad_values() {
        let zero = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid { .. })));

        let mut bad_factor = Config::default();
        bad_factor.backoff.factor = f64::NAN;
        assert!(bad_factor.validate().is_err());

        let mut inverted = Config::default();
        inverted.backoff.first_ms = 5_000;
        inverted.backoff.max_ms = 10;
        assert!(inverted.validate().is_err());

        let bad_cron = Config {
            schedule: Some("not-a-cron".into()),
            ..Config::default()
        };
        assert!(matches!(bad_cron.validate(), Err(ConfigError::Invalid { .. })));
    }
}
