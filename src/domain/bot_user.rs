//! Bot users - people who have talked to the bot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, UserId};

/// What a user may do beyond filling in dialogues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "member" => Ok(UserRole::Member),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Sender details as reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub user_id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl SenderProfile {
    pub fn new(user_id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
        }
    }
}

/// A registered bot user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotUser {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: UserRole,
    /// Last time the user opened the bot with `/start`.
    pub viewed_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BotUser {
    /// First registration of `profile`.
    pub fn register(profile: SenderProfile, role: UserRole, now: Timestamp) -> Self {
        Self {
            user_id: profile.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            username: profile.username,
            role,
            viewed_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes names from a newer profile and marks the user as seen.
    ///
    /// The role only ever goes up: an existing admin stays admin even when
    /// the configured admin list no longer names them.
    pub fn touch(&mut self, profile: SenderProfile, role: UserRole, now: Timestamp) {
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        self.username = profile.username;
        if role == UserRole::Admin {
            self.role = UserRole::Admin;
        }
        self.viewed_at = now;
        self.updated_at = now;
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
