//! No-op store that keeps nothing.
//!
//! Used when no database is configured. Every open starts from an empty
//! ledger and every commit is accepted.

use super::{LedgerStore, StoreError, StoredLedger};
use crate::ledger::{Commit, LedgerIdentity};
use async_trait::async_trait;

pub struct NoOpStore;

#[async_trait]
impl LedgerStore for NoOpStore {
    async fn open(&self, _identity: &LedgerIdentity) -> Result<StoredLedger, StoreError> {
        Ok(StoredLedger::default())
    }

    async fn persist(&self, _commit: &Commit) -> Result<(), StoreError> {
        Ok(())
    }
}
