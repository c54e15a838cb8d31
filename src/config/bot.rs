//! Bot configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::foundation::UserId;

/// Bot configuration
#[derive(Clone, Deserialize, Default)]
pub struct BotConfig {
    /// Chat platform token
    pub token: Option<String>,

    /// Users promoted to admin on `/start` (comma-separated ids)
    #[serde(default)]
    pub admin_user_ids: String,

    /// YAML dialogue catalog; the built-in dialogues are used when unset
    pub dialogues_path: Option<PathBuf>,
}

impl BotConfig {
    /// Token wrapped so it never ends up in logs.
    pub fn token(&self) -> Option<SecretString> {
        self.token.clone().map(SecretString::new)
    }

    /// Parsed admin user ids.
    pub fn admin_ids(&self) -> Result<HashSet<UserId>, ValidationError> {
        self.admin_user_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>()
                    .map(UserId::new)
                    .map_err(|_| ValidationError::InvalidAdminId(id.to_string()))
            })
            .collect()
    }

    /// Validate bot configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::EmptyBotToken);
        }
        self.admin_ids()?;
        Ok(())
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("admin_user_ids", &self.admin_user_ids)
            .field("dialogues_path", &self.dialogues_path)
            .finish()
    }
}
