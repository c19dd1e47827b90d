//! Batch configuration.
//!
//! Values come from code or from the environment (optionally seeded by a `.env`
//! file):
//!
//! - `FORECAST_FAILURE_POLICY`: `fail_fast` (default) or `partial`
//! - `FORECAST_JOIN_TIMEOUT_SECS`: bound on the batch join (unset = wait forever)
//! - `FORECAST_WORKERS`: worker threads for the pool scheduler (unset = rayon default)

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// What a batch does when a column fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop joining as soon as a column fails, cancel the rest and return the
    /// failure (the first in input order if several have settled).
    #[default]
    FailFast,
    /// Return every successful column and report failed columns alongside.
    Partial,
}

impl FromStr for FailurePolicy {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "partial" => Ok(FailurePolicy::Partial),
            other => Err(ForecastError::Config(format!(
                "Unknown failure policy '{other}' (expected fail_fast or partial)."
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchConfig {
    pub failure_policy: FailurePolicy,
    pub join_timeout: Option<Duration>,
    pub workers: Option<usize>,
}

impl BatchConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in `from_env`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("FORECAST_FAILURE_POLICY") {
            config.failure_policy = raw.parse()?;
        }

        if let Some(raw) = lookup("FORECAST_JOIN_TIMEOUT_SECS") {
            let secs: f64 = raw.trim().parse().map_err(|e| {
                ForecastError::Config(format!("Invalid FORECAST_JOIN_TIMEOUT_SECS '{raw}': {e}"))
            })?;
            if !(secs.is_finite() && secs > 0.0) {
                return Err(ForecastError::Config(format!(
                    "FORECAST_JOIN_TIMEOUT_SECS must be positive, got {secs}."
                )));
            }
            let timeout = Duration::try_from_secs_f64(secs).map_err(|e| {
                ForecastError::Config(format!("Invalid FORECAST_JOIN_TIMEOUT_SECS '{raw}': {e}"))
            })?;
            config.join_timeout = Some(timeout);
        }

        if let Some(raw) = lookup("FORECAST_WORKERS") {
            let workers: usize = raw.trim().parse().map_err(|e| {
                ForecastError::Config(format!("Invalid FORECAST_WORKERS '{raw}': {e}"))
            })?;
            if workers == 0 {
                return Err(ForecastError::Config("FORECAST_WORKERS must be >= 1.".to_string()));
            }
            config.workers = Some(workers);
        }

        Ok(config)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = BatchConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BatchConfig::default());
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn reads_all_keys() {
        let config = BatchConfig::from_lookup(lookup(&[
            ("FORECAST_FAILURE_POLICY", "partial"),
            ("FORECAST_JOIN_TIMEOUT_SECS", "2.5"),
            ("FORECAST_WORKERS", "4"),
        ]))
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Partial);
        assert_eq!(config.join_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.workers, Some(4));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(BatchConfig::from_lookup(lookup(&[("FORECAST_FAILURE_POLICY", "maybe")])).is_err());
        assert!(BatchConfig::from_lookup(lookup(&[("FORECAST_JOIN_TIMEOUT_SECS", "-1")])).is_err());
        assert!(BatchConfig::from_lookup(lookup(&[("FORECAST_WORKERS", "0")])).is_err());
    }

    #[test]
    fn huge_timeout_is_a_config_error() {
        let err = BatchConfig::from_lookup(lookup(&[("FORECAST_JOIN_TIMEOUT_SECS", "1e30")])).unwrap_err();
        assert!(matches!(err, ForecastError::Config(ref m) if m.contains("FORECAST_JOIN_TIMEOUT_SECS")));
    }
}
