//! SQLite-backed ledger store.

use super::{LedgerStore, StoreError, StoredLedger};
use crate::db::Database;
use crate::ledger::{Commit, LedgerIdentity};
use async_trait::async_trait;
use tracing::{debug, info};

pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn open(&self, identity: &LedgerIdentity) -> Result<StoredLedger, StoreError> {
        let stored = self.db.meta().bind(identity).await?;
        if stored.administrator != identity.administrator {
            return Err(StoreError::IdentityMismatch {
                expected: identity.administrator.clone(),
                found: stored.administrator,
            });
        }
        if stored.name != identity.name || stored.symbol != identity.symbol {
            return Err(StoreError::CollectionMismatch {
                expected: format!("{} ({})", identity.name, identity.symbol),
                found: format!("{} ({})", stored.name, stored.symbol),
            });
        }

        let channels = self.db.channels().load_all().await?;
        let tokens = self.db.memberships().load_tokens().await?;
        let treasury = self.db.treasury().load().await?;
        let profiles = self.db.profiles().load_all().await?;

        let admissions = self.db.memberships().count_admissions().await?;
        if admissions != tokens.len() as u64 {
            return Err(StoreError::Corrupt(format!(
                "{} admission rows for {} tokens",
                admissions,
                tokens.len()
            )));
        }
        let orphaned = self.db.memberships().count_orphaned_tokens().await?;
        if orphaned > 0 {
            return Err(StoreError::Corrupt(format!(
                "{} tokens without a matching admission",
                orphaned
            )));
        }

        info!(
            channels = channels.len(),
            tokens = tokens.len(),
            profiles = profiles.len(),
            balance = %treasury.balance,
            "Loaded ledger from database"
        );

        Ok(StoredLedger {
            channels,
            tokens,
            treasury,
            profiles,
        })
    }

    async fn persist(&self, commit: &Commit) -> Result<(), StoreError> {
        debug!(kind = commit.kind(), "Persisting commit");
        match commit {
            Commit::ChannelCreated(channel) => self.db.channels().insert(channel).await?,
            Commit::MemberAdmitted(admission) => {
                self.db
                    .memberships()
                    .admit(&admission.token, admission.paid, &admission.treasury)
                    .await?
            }
            Commit::TreasuryWithdrawn(payout) => {
                self.db
                    .treasury()
                    .record_withdrawal(&payout.recipient, payout.amount, &payout.treasury)
                    .await?
            }
            Commit::ProfileSet(update) => {
                self.db
                    .profiles()
                    .upsert(&update.account, &update.profile)
                    .await?
            }
        }
        Ok(())
    }
}
