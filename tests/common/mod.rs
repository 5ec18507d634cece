//! Integration test common infrastructure.
//!
//! Builds ledgers over the in-memory or SQLite store and provides the
//! `tokens(n)` unit helper used throughout the scenarios.

#![allow(dead_code)]

use chanledger::db::Database;
use chanledger::ledger::{AccountId, Amount, Ledger, LedgerIdentity, LedgerOptions};
use chanledger::store::SqliteStore;
use std::path::Path;
use std::sync::Arc;

pub const DECIMALS: u32 = 18;

/// `n` whole units in the smallest denomination.
pub fn tokens(n: u128) -> Amount {
    Amount::whole(n, DECIMALS).expect("amount fits")
}

/// Parse a decimal unit string such as `"0.5"`.
pub fn units(s: &str) -> Amount {
    Amount::parse_decimal(s, DECIMALS).expect("valid amount")
}

pub fn account(name: &str) -> AccountId {
    AccountId::from(name)
}

pub fn deployer() -> AccountId {
    account("deployer")
}

pub fn identity() -> LedgerIdentity {
    LedgerIdentity {
        administrator: deployer(),
        name: "Dappcord".into(),
        symbol: "DC".into(),
    }
}

/// A fresh ledger with no persistence.
pub fn memory_ledger() -> Ledger {
    Ledger::in_memory(identity(), LedgerOptions::default())
}

/// Open (or reopen) a SQLite-backed ledger at `path`.
pub async fn sqlite_ledger(path: &Path) -> Ledger {
    let db = Database::new(path.to_str().expect("utf-8 path"))
        .await
        .expect("Failed to open database");
    Ledger::open(identity(), LedgerOptions::default(), Arc::new(SqliteStore::new(db)))
        .await
        .expect("Failed to open ledger")
}

/// A ledger with channel 1 "general" priced at one unit.
pub async fn ledger_with_general() -> Ledger {
    let ledger = memory_ledger();
    ledger
        .create_channel(&deployer(), "general", tokens(1))
        .await
        .expect("Failed to create channel");
    ledger
}
