//! Retry decisions for recoverable error states.
//!
//! The reducer only counts retries; whether and when to retry is decided
//! here, outside the state machine.

use crate::state::{capability, ErrorState, PlayerState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed per error before giving up
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Outcome of [`RetryPolicy::decide`]
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Reload the source after `delay`; `attempt` starts at 1
    Retry { attempt: u32, delay: Duration },
    /// Retries are exhausted or the error is fatal
    GiveUp(ErrorState),
    /// The state is not an error
    NotAnError,
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryDecision::Retry { .. })
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    /// Whether `error` may be retried once more. Fatal errors never are.
    pub fn allows(&self, error: &ErrorState) -> bool {
        match error.retry_count() {
            Some(count) => count < self.max_retries,
            None => false,
        }
    }

    /// Backoff before retry number `attempt` (1-based): the base delay
    /// doubled per previous attempt, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }

    pub fn decide(&self, state: &PlayerState) -> RetryDecision {
        let Some(error) = capability::error(state) else {
            return RetryDecision::NotAnError;
        };

        if !self.allows(error) {
            return RetryDecision::GiveUp(error.clone());
        }

        let attempt = error.retry_count().unwrap_or(0) + 1;
        RetryDecision::Retry {
            attempt,
            delay: self.delay_for(attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(retry_count: u32) -> PlayerState {
        PlayerState::Error(ErrorState::network("timeout", Some("v.mp4".into())).with_retry_count(retry_count))
    }

    #[test]
    fn test_retries_until_exhausted() {
        let policy = RetryPolicy::new(2);

        assert_eq!(
            policy.decide(&network(0)),
            RetryDecision::Retry {
                attempt: 1,
                delay: Duration::from_millis(1000)
            }
        );
        assert!(policy.decide(&network(1)).should_retry());
        assert!(matches!(policy.decide(&network(2)), RetryDecision::GiveUp(_)));
    }

    #[test]
    fn test_fatal_errors_never_retry() {
        let policy = RetryPolicy::new(10);
        let state = PlayerState::Error(ErrorState::NotSupported {
            error: "hevc".into(),
            codec: Some("hvc1".into()),
            url: None,
        });

        assert!(matches!(policy.decide(&state), RetryDecision::GiveUp(ErrorState::NotSupported { .. })));
    }

    #[test]
    fn test_non_error_states() {
        assert_eq!(RetryPolicy::default().decide(&PlayerState::Idle), RetryDecision::NotAnError);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10).with_backoff(Duration::from_millis(100), Duration::from_millis(500));

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(500));
    }
}
