//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Bot token must not be empty when set")]
    EmptyBotToken,

    #[error("Invalid admin user id: {0}")]
    InvalidAdminId(String),

    #[error("Invalid duration for {0}: must be greater than zero")]
    InvalidDuration(&'static str),

    #[error("Retry max_attempts must be at least 1")]
    InvalidRetryAttempts,

    #[error("Retry initial backoff exceeds max backoff")]
    InvalidBackoff,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
