//! Treasury totals and the withdrawal log.

use super::{DbError, parse_amount};
use crate::ledger::{AccountId, Amount, Treasury};
use sqlx::{SqliteConnection, SqlitePool};

/// A completed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub id: i64,
    pub recipient: AccountId,
    pub amount: Amount,
    pub withdrawn_at: i64,
}

/// Repository for treasury state.
pub struct TreasuryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TreasuryRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn load(&self) -> Result<Treasury, DbError> {
        let (balance, collected, withdrawn) = sqlx::query_as::<_, (String, String, String)>(
            "SELECT balance, collected, withdrawn FROM treasury WHERE id = 1",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(Treasury {
            balance: parse_amount("treasury.balance", &balance)?,
            collected: parse_amount("treasury.collected", &collected)?,
            withdrawn: parse_amount("treasury.withdrawn", &withdrawn)?,
        })
    }

    /// Log a withdrawal and install the drained totals in one transaction.
    pub async fn record_withdrawal(
        &self,
        recipient: &AccountId,
        amount: Amount,
        treasury: &Treasury,
    ) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO withdrawals (recipient, amount, withdrawn_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(recipient.as_str())
        .bind(amount.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        write_totals(&mut tx, treasury).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Withdrawal log, oldest first.
    pub async fn withdrawals(&self) -> Result<Vec<Withdrawal>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, String, i64)>(
            "SELECT id, recipient, amount, withdrawn_at FROM withdrawals ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, recipient, amount, withdrawn_at)| {
                Ok(Withdrawal {
                    id,
                    recipient: AccountId::new(recipient),
                    amount: parse_amount("withdrawals.amount", &amount)?,
                    withdrawn_at,
                })
            })
            .collect()
    }
}

/// Overwrite the treasury row. Callers run this inside their transaction.
pub(super) async fn write_totals(
    conn: &mut SqliteConnection,
    treasury: &Treasury,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE treasury SET balance = ?, collected = ?, withdrawn = ? WHERE id = 1",
    )
    .bind(treasury.balance.to_string())
    .bind(treasury.collected.to_string())
    .bind(treasury.withdrawn.to_string())
    .execute(conn)
    .await?;

    if result.rows_affected() != 1 {
        return Err(DbError::Internal("treasury row missing".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_fresh_treasury_is_empty() {
        let db = Database::new(":memory:").await.unwrap();
        assert_eq!(db.treasury().load().await.unwrap(), Treasury::default());
        assert!(db.treasury().withdrawals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_withdrawal() {
        let db = Database::new(":memory:").await.unwrap();
        let drained = Treasury {
            balance: Amount::ZERO,
            collected: Amount::new(10),
            withdrawn: Amount::new(10),
        };
        db.treasury()
            .record_withdrawal(&AccountId::from("deployer"), Amount::new(10), &drained)
            .await
            .unwrap();

        assert_eq!(db.treasury().load().await.unwrap(), drained);
        let log = db.treasury().withdrawals().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].recipient, AccountId::from("deployer"));
        assert_eq!(log[0].amount, Amount::new(10));
    }
}
