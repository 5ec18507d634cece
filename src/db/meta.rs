//! Ledger identity record.

use super::DbError;
use crate::ledger::{AccountId, LedgerIdentity};
use sqlx::SqlitePool;

/// Repository for the single-row ledger identity.
pub struct MetaRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MetaRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the recorded identity, if any.
    pub async fn find(&self) -> Result<Option<LedgerIdentity>, DbError> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT administrator, name, symbol FROM ledger_meta WHERE id = 1",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(administrator, name, symbol)| LedgerIdentity {
            administrator: AccountId::new(administrator),
            name,
            symbol,
        }))
    }

    /// Record `identity` on first use and return whatever identity the store
    /// holds afterwards. An existing record is never overwritten.
    pub async fn bind(&self, identity: &LedgerIdentity) -> Result<LedgerIdentity, DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO ledger_meta (id, administrator, name, symbol, created_at)
            VALUES (1, ?, ?, ?, ?)
            "#,
        )
        .bind(identity.administrator.as_str())
        .bind(&identity.name)
        .bind(&identity.symbol)
        .bind(now)
        .execute(self.pool)
        .await?;

        self.find()
            .await?
            .ok_or_else(|| DbError::Internal("ledger_meta row missing after bind".into()))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::ledger::{AccountId, LedgerIdentity};

    fn identity(admin: &str) -> LedgerIdentity {
        LedgerIdentity {
            administrator: AccountId::from(admin),
            name: "Dappcord".into(),
            symbol: "DC".into(),
        }
    }

    #[tokio::test]
    async fn test_bind_is_first_writer_wins() {
        let db = Database::new(":memory:").await.unwrap();
        assert!(db.meta().find().await.unwrap().is_none());

        let first = db.meta().bind(&identity("deployer")).await.unwrap();
        assert_eq!(first, identity("deployer"));

        let second = db.meta().bind(&identity("hacker")).await.unwrap();
        assert_eq!(second.administrator, AccountId::from("deployer"));
    }
}
