//! Profile repository.

use super::DbError;
use crate::ledger::{AccountId, Profile};
use sqlx::SqlitePool;

/// Repository for account profiles.
pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the profile for `account`.
    pub async fn upsert(&self, account: &AccountId, profile: &Profile) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO profiles (account, name, bio, avatar_url, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(account) DO UPDATE SET
                name = excluded.name,
                bio = excluded.bio,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(account.as_str())
        .bind(&profile.name)
        .bind(&profile.bio)
        .bind(&profile.avatar_url)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn find(&self, account: &AccountId) -> Result<Option<Profile>, DbError> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT name, bio, avatar_url FROM profiles WHERE account = ?",
        )
        .bind(account.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(name, bio, avatar_url)| Profile {
            name,
            bio,
            avatar_url,
        }))
    }

    pub async fn load_all(&self) -> Result<Vec<(AccountId, Profile)>, DbError> {
        let rows = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT account, name, bio, avatar_url FROM profiles ORDER BY account",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(account, name, bio, avatar_url)| {
                (
                    AccountId::new(account),
                    Profile {
                        name,
                        bio,
                        avatar_url,
                    },
                )
            })
            .collect())
    }
}
