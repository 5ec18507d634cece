//! chanledger - token-gated community channel ledger.
//!
//! An administrator creates priced channels; anyone may pay at least the
//! price to join one, receiving a non-transferable membership token. Payments
//! accumulate in a treasury that only the administrator can sweep. Accounts
//! may also keep a free-form profile.
//!
//! Start at [`ledger::Ledger`].

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod ledger;
pub mod metrics;
pub mod store;
pub mod telemetry;

pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
