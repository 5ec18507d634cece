//! Channel repository.

use super::{DbError, is_unique_violation, parse_amount};
use crate::ledger::{Channel, ChannelId};
use sqlx::SqlitePool;

/// Repository for channel definitions.
pub struct ChannelRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChannelRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a newly created channel under its assigned id.
    pub async fn insert(&self, channel: &Channel) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO channels (id, name, price, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(channel.id.get() as i64)
        .bind(&channel.name)
        .bind(channel.price.to_string())
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::ChannelExists(channel.id.get());
            }
            DbError::from(e)
        })?;
        Ok(())
    }

    /// Load all channels in id order.
    pub async fn load_all(&self) -> Result<Vec<Channel>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, name, price FROM channels ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, name, price)| {
                Ok(Channel {
                    id: ChannelId(id as u64),
                    name,
                    price: parse_amount("channels.price", &price)?,
                })
            })
            .collect()
    }
}
