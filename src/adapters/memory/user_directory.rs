//! In-memory user directory.

use async_trait::async_trait;
use std::collections::HashSet;

use super::InMemoryDatabase;
use crate::domain::bot_user::{BotUser, SenderProfile, UserRole};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{StoreError, UserDirectory};

/// In-memory [`UserDirectory`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    db: InMemoryDatabase,
    admins: HashSet<UserId>,
}

impl InMemoryUserDirectory {
    pub fn new(db: InMemoryDatabase, admins: HashSet<UserId>) -> Self {
        Self { db, admins }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn register(&self, profile: SenderProfile) -> Result<BotUser, StoreError> {
        let role = if self.admins.contains(&profile.user_id) {
            UserRole::Admin
        } else {
            UserRole::Member
        };
        let now = Timestamp::now();

        let mut tables = self.db.tables().write().await;
        let user = match tables.users.remove(&profile.user_id) {
            Some(mut existing) => {
                existing.touch(profile, role, now);
                existing
            }
            None => BotUser::register(profile, role, now),
        };
        tables.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn find(&self, user_id: UserId) -> Result<Option<BotUser>, StoreError> {
        Ok(self.db.tables().read().await.users.get(&user_id).cloned())
    }
}
