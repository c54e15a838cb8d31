//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ARQUEA` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use arquea::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Storing conversations in {:?}", config.database.backend);
//! ```

mod bot;
mod database;
mod dialogue;
mod error;
mod logging;
mod retry;

pub use bot::BotConfig;
pub use database::{DatabaseConfig, StorageBackend};
pub use dialogue::DialogueConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use retry::RetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Storage backend and PostgreSQL connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Bot token, admins and dialogue catalog
    #[serde(default)]
    pub bot: BotConfig,

    /// Staleness threshold and sweep interval
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Retry policy for storage calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Log level and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ARQUEA` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ARQUEA__DATABASE__URL=...` -> `database.url = ...`
    /// - `ARQUEA__BOT__ADMIN_USER_IDS=1,2` -> `bot.admin_user_ids = "1,2"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("ARQUEA").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.bot.validate()?;
        self.dialogue.validate()?;
        self.retry.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ARQUEA__DATABASE__URL",
        "ARQUEA__DATABASE__BACKEND",
        "ARQUEA__BOT__ADMIN_USER_IDS",
        "ARQUEA__DIALOGUE__STALENESS_THRESHOLD_SECS",
        "ARQUEA__RETRY__MAX_ATTEMPTS",
        "ARQUEA__LOGGING__JSON",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ARQUEA__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("ARQUEA__BOT__ADMIN_USER_IDS", "7,8");
        env::set_var("ARQUEA__RETRY__MAX_ATTEMPTS", "5");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.database.backend, StorageBackend::Postgres);
        assert_eq!(config.bot.admin_ids().unwrap().len(), 2);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_backend_loads_without_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ARQUEA__DATABASE__BACKEND", "memory");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_unset() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ARQUEA__DATABASE__BACKEND", "memory");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.dialogue.staleness_threshold_secs, 86_400);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.bot.dialogues_path.is_none());
    }

    #[test]
    fn test_postgres_without_url_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("DATABASE_URL"))
        );
    }

    #[test]
    fn test_custom_staleness_threshold() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ARQUEA__DATABASE__BACKEND", "memory");
        env::set_var("ARQUEA__DIALOGUE__STALENESS_THRESHOLD_SECS", "60");
        env::set_var("ARQUEA__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.dialogue.staleness_threshold_secs, 60);
        assert!(config.logging.json);
    }
}
