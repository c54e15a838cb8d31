//! User directory port - bot users and their roles.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::bot_user::{BotUser, SenderProfile};
use crate::domain::foundation::UserId;

/// Port for registering and looking up bot users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Registers `profile`, or refreshes names and `viewed_at` of a known user.
    ///
    /// Ids listed as administrators get the admin role; other users keep
    /// their stored role (new users are members).
    async fn register(&self, profile: SenderProfile) -> Result<BotUser, StoreError>;

    /// Finds a user by id.
    async fn find(&self, user_id: UserId) -> Result<Option<BotUser>, StoreError>;
}
