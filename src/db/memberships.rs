//! Admission and membership token repository.

use super::treasury::write_totals;
use super::{DbError, is_unique_violation};
use crate::ledger::{AccountId, Amount, ChannelId, MembershipToken, TokenId, Treasury};
use sqlx::SqlitePool;

/// Repository for admissions and the tokens that prove them.
pub struct MembershipRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MembershipRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a paid admission.
    ///
    /// Token, admission and treasury totals are written in one transaction so
    /// a crash can never leave a token without its admission or payment.
    pub async fn admit(
        &self,
        token: &MembershipToken,
        paid: Amount,
        treasury: &Treasury,
    ) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tokens (id, owner, channel_id, paid, minted_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.get() as i64)
        .bind(token.owner.as_str())
        .bind(token.channel_id.get() as i64)
        .bind(paid.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::TokenExists(token.id.get());
            }
            DbError::from(e)
        })?;

        sqlx::query(
            r#"
            INSERT INTO admissions (channel_id, account, token_id)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(token.channel_id.get() as i64)
        .bind(token.owner.as_str())
        .bind(token.id.get() as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::AdmissionExists {
                    channel_id: token.channel_id.get(),
                    account: token.owner.to_string(),
                };
            }
            DbError::from(e)
        })?;

        write_totals(&mut tx, treasury).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Load every token in mint order.
    pub async fn load_tokens(&self) -> Result<Vec<MembershipToken>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT id, owner, channel_id FROM tokens ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, owner, channel_id)| MembershipToken {
                id: TokenId(id as u64),
                owner: AccountId::new(owner),
                channel_id: ChannelId(channel_id as u64),
            })
            .collect())
    }

    /// Number of admission rows; must always equal the token count.
    pub async fn count_admissions(&self) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admissions")
            .fetch_one(self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Tokens whose admission row is missing or points elsewhere.
    pub async fn count_orphaned_tokens(&self) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tokens t
            LEFT JOIN admissions a
              ON a.token_id = t.id AND a.channel_id = t.channel_id AND a.account = t.owner
            WHERE a.token_id IS NULL
            "#,
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::ledger::Channel;

    async fn db_with_channel() -> Database {
        let db = Database::new(":memory:").await.unwrap();
        db.channels()
            .insert(&Channel {
                id: ChannelId(1),
                name: "general".into(),
                price: Amount::new(1),
            })
            .await
            .unwrap();
        db
    }

    fn token(id: u64, owner: &str) -> MembershipToken {
        MembershipToken {
            id: TokenId(id),
            owner: AccountId::from(owner),
            channel_id: ChannelId(1),
        }
    }

    fn credited(total: u128) -> Treasury {
        Treasury {
            balance: Amount::new(total),
            collected: Amount::new(total),
            withdrawn: Amount::ZERO,
        }
    }

    #[tokio::test]
    async fn test_admit_writes_all_tables() {
        let db = db_with_channel().await;
        db.memberships()
            .admit(&token(1, "alice"), Amount::new(1), &credited(1))
            .await
            .unwrap();

        assert_eq!(db.memberships().load_tokens().await.unwrap(), vec![token(1, "alice")]);
        assert_eq!(db.memberships().count_admissions().await.unwrap(), 1);
        assert_eq!(db.memberships().count_orphaned_tokens().await.unwrap(), 0);
        assert_eq!(db.treasury().load().await.unwrap(), credited(1));
    }

    #[tokio::test]
    async fn test_duplicate_admission_rolls_back() {
        let db = db_with_channel().await;
        db.memberships()
            .admit(&token(1, "alice"), Amount::new(1), &credited(1))
            .await
            .unwrap();

        let err = db
            .memberships()
            .admit(&token(2, "alice"), Amount::new(1), &credited(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AdmissionExists { channel_id: 1, .. }));

        // The token insert that preceded the failing admission insert is gone.
        assert_eq!(db.memberships().load_tokens().await.unwrap().len(), 1);
        assert_eq!(db.treasury().load().await.unwrap(), credited(1));
    }

    #[tokio::test]
    async fn test_unknown_channel_rejected_by_foreign_key() {
        let db = db_with_channel().await;
        let stray = MembershipToken {
            id: TokenId(1),
            owner: AccountId::from("alice"),
            channel_id: ChannelId(9),
        };
        assert!(
            db.memberships()
                .admit(&stray, Amount::new(1), &credited(1))
                .await
                .is_err()
        );
        assert!(db.memberships().load_tokens().await.unwrap().is_empty());
    }
}
