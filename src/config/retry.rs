//! Retry configuration for storage calls

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::RetryPolicy;

/// Retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidRetryAttempts);
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ValidationError::InvalidBackoff);
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    200
}

fn default_max_backoff() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_router_default() {
        assert_eq!(RetryConfig::default().policy(), RetryPolicy::default());
    }

    #[test]
    fn test_validation() {
        let zero = RetryConfig {
            max_attempts: 0,
            ..Default::default()
        };
        let inverted = RetryConfig {
            initial_backoff_ms: 5000,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(ValidationError::InvalidRetryAttempts));
        assert_eq!(inverted.validate(), Err(ValidationError::InvalidBackoff));
    }
}
