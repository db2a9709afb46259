use crate::error::{Error, Result};
use serde::Deserialize;
use std::convert::TryFrom;
use std::time::Duration;

/// A fully resolved retry schedule.
///
/// `RetryConfig` is plain data. The engine keeps one as its default and every call resolves
/// its own copy by applying the caller's override on top of that default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound on any single wait. May be lower than `initial_delay`, in which case every
    /// wait equals `max_delay`.
    pub max_delay: Duration,
    /// Multiplier applied to the wait after each failed attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Parse a JSON document of optional fields and apply it over the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config = ConfigUpdate::from_json(json)?.apply_to(&Self::default());
        config.validate()?;
        Ok(config)
    }

    /// Reject schedules the attempt loop cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(Error::InvalidPolicy(format!(
                "backoff_factor must be a finite number >= 1, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// The wait that follows failed attempt number `attempt` (1-indexed), i.e.
    /// `min(initial_delay * backoff_factor^(attempt - 1), max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_factor.powi(exponent);
        let cap = self.max_delay.as_nanos() as f64;
        if nanos.is_nan() || nanos >= cap {
            return self.max_delay;
        }
        Duration::from_nanos(nanos.round() as u64)
    }
}

/// A partial [`RetryConfig`]. Fields left as `None` keep the value of whatever config the
/// update is applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawUpdate")]
pub struct ConfigUpdate {
    pub max_attempts: Option<u32>,
    pub initial_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
    pub backoff_factor: Option<f64>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = Some(factor);
        self
    }

    /// Shallow merge: every field present in `self` replaces the one in `base`.
    pub fn apply_to(&self, base: &RetryConfig) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_delay: self.initial_delay.unwrap_or(base.initial_delay),
            max_delay: self.max_delay.unwrap_or(base.max_delay),
            backoff_factor: self.backoff_factor.unwrap_or(base.backoff_factor),
        }
    }

    /// Parse an update such as `{"max_attempts": 5, "initial_delay_ms": 250}`. Durations are
    /// integer milliseconds and unknown keys are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|error| Error::Config {
            error,
            msg: json.to_string(),
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUpdate {
    max_attempts: Option<u32>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    backoff_factor: Option<f64>,
}

impl From<RawUpdate> for ConfigUpdate {
    fn from(raw: RawUpdate) -> Self {
        Self {
            max_attempts: raw.max_attempts,
            initial_delay: raw.initial_delay_ms.map(Duration::from_millis),
            max_delay: raw.max_delay_ms.map(Duration::from_millis),
            backoff_factor: raw.backoff_factor,
        }
    }
}
