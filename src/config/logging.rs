//! Logging configuration

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use super::error::ValidationError;

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// `RUST_LOG` when set, otherwise the configured level.
    pub fn env_filter(&self) -> Result<EnvFilter, ValidationError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level)
            .map_err(|e| ValidationError::InvalidLogFilter(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidLogFilter(e.to_string()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_directive_with_targets_is_valid() {
        let config = LoggingConfig {
            level: "arquea=debug,sqlx=warn".to_string(),
            json: true,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_garbage_directive_is_rejected() {
        let config = LoggingConfig {
            level: "arquea=loud".to_string(),
            json: false,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidLogFilter(_))
        ));
    }
}
