//! PostgreSQL implementation of UserDirectory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashSet;

use super::errors::store_error;
use crate::domain::bot_user::{BotUser, SenderProfile, UserRole};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{StoreError, UserDirectory};

/// PostgreSQL implementation of UserDirectory.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
    admins: HashSet<UserId>,
}

impl PostgresUserDirectory {
    /// Creates a new PostgresUserDirectory; `admins` are promoted on registration.
    pub fn new(pool: PgPool, admins: HashSet<UserId>) -> Self {
        Self { pool, admins }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn register(&self, profile: SenderProfile) -> Result<BotUser, StoreError> {
        let role = if self.admins.contains(&profile.user_id) {
            UserRole::Admin
        } else {
            UserRole::Member
        };
        let now = Timestamp::now();

        // An existing admin is never demoted by a later registration.
        let row = sqlx::query(
            r#"
            INSERT INTO bot_users (
                user_id, first_name, last_name, username, role,
                viewed_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $6, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                username = EXCLUDED.username,
                role = CASE WHEN EXCLUDED.role = 'admin' THEN 'admin' ELSE bot_users.role END,
                viewed_at = EXCLUDED.viewed_at,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, first_name, last_name, username, role,
                      viewed_at, created_at, updated_at
            "#,
        )
        .bind(profile.user_id.as_i64())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.username)
        .bind(role.as_str())
        .bind(now.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("Failed to register user", e))?;

        row_to_user(&row)
    }

    async fn find(&self, user_id: UserId) -> Result<Option<BotUser>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, first_name, last_name, username, role,
                   viewed_at, created_at, updated_at
            FROM bot_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to fetch user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn row_to_user(row: &PgRow) -> Result<BotUser, StoreError> {
    let column = |e: sqlx::Error| store_error("Failed to read user row", e);

    let user_id: i64 = row.try_get("user_id").map_err(column)?;
    let role: String = row.try_get("role").map_err(column)?;
    let viewed_at: DateTime<Utc> = row.try_get("viewed_at").map_err(column)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(column)?;

    Ok(BotUser {
        user_id: UserId::new(user_id),
        first_name: row.try_get("first_name").map_err(column)?,
        last_name: row.try_get("last_name").map_err(column)?,
        username: row.try_get("username").map_err(column)?,
        role: role.parse().map_err(StoreError::Serialization)?,
        viewed_at: Timestamp::from_datetime(viewed_at),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}
