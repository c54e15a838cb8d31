//! Dialogue timing configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// How long conversations may sit idle, and how often they are swept.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl DialogueConfig {
    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.staleness_threshold_secs == 0 {
            return Err(ValidationError::InvalidDuration("staleness_threshold_secs"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidDuration("sweep_interval_secs"));
        }
        Ok(())
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: default_staleness_threshold(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_staleness_threshold() -> u64 {
    86_400
}

fn default_sweep_interval() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DialogueConfig::default();
        assert_eq!(config.staleness_threshold(), Duration::from_secs(86_400));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = DialogueConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidDuration("sweep_interval_secs"))
        );
    }
}
