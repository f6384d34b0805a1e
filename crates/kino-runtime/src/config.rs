//! Runtime configuration

use crate::error::{Result, RuntimeError};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Retries allowed per recoverable error
    pub retry_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub retry_delay_ms: u64,
    /// Upper bound for the retry backoff in milliseconds
    pub max_retry_delay_ms: u64,
    /// Volume applied to every adapter once attached (0.0 - 1.0)
    pub initial_volume: f64,
    /// Start muted
    pub initial_muted: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 30_000,
            initial_volume: 1.0,
            initial_muted: false,
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RuntimeConfig =
            serde_json::from_str(json).map_err(|e| RuntimeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(RuntimeError::InvalidConfig(format!(
                "initial_volume must be within 0.0..=1.0, got {}",
                self.initial_volume
            )));
        }
        if self.max_retry_delay_ms < self.retry_delay_ms {
            return Err(RuntimeError::InvalidConfig(format!(
                "max_retry_delay_ms ({}) is below retry_delay_ms ({})",
                self.max_retry_delay_ms, self.retry_delay_ms
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts).with_backoff(
            Duration::from_millis(self.retry_delay_ms),
            Duration::from_millis(self.max_retry_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RuntimeConfig::from_json_str(r#"{ "retry_attempts": 5, "initial_muted": true }"#).unwrap();
        assert_eq!(config.retry_attempts, 5);
        assert!(config.initial_muted);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.initial_volume, 1.0);
    }

    #[test]
    fn test_rejects_out_of_range_volume() {
        let err = RuntimeConfig::from_json_str(r#"{ "initial_volume": 1.5 }"#).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(RuntimeConfig::from_json_str("{ retry_attempts: }").is_err());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RuntimeConfig::default().retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
    }
}
