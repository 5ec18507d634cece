//! Ledger persistence abstraction.
//!
//! The ledger writer persists every [`Commit`] through a [`LedgerStore`]
//! before applying it in memory, so a store failure leaves both sides
//! unchanged.

use crate::db::DbError;
use crate::ledger::{AccountId, Channel, Commit, LedgerIdentity, MembershipToken, Profile, Treasury};
use async_trait::async_trait;
use thiserror::Error;

pub mod noop;
pub mod sqlite;

pub use noop::NoOpStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("store belongs to administrator {found}, configured {expected}")]
    IdentityMismatch {
        expected: AccountId,
        found: AccountId,
    },
    #[error("store was created for collection {found}, configured {expected}")]
    CollectionMismatch { expected: String, found: String },
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Raw persisted rows, validated by `LedgerState::restore`.
#[derive(Debug, Clone, Default)]
pub struct StoredLedger {
    pub channels: Vec<Channel>,
    pub tokens: Vec<MembershipToken>,
    pub treasury: Treasury,
    pub profiles: Vec<(AccountId, Profile)>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Bind the store to `identity` and load everything it holds.
    ///
    /// A fresh store records the identity; an existing one must match it.
    async fn open(&self, identity: &LedgerIdentity) -> Result<StoredLedger, StoreError>;

    /// Durably record one commit, all-or-nothing.
    async fn persist(&self, commit: &Commit) -> Result<(), StoreError>;
}
