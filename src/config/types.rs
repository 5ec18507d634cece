//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_decimals, default_name, default_queue_capacity, default_symbol};
use crate::ledger::{AccountId, LedgerIdentity, LedgerOptions};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ledger: LedgerConfig,
    /// Absent means the ledger lives in memory only.
    pub database: Option<DatabaseConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Ledger identity and writer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// The sole privileged account. Fixed for the life of a database.
    pub administrator: String,
    /// Collection name.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Decimal places used to parse and display amounts.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Fail a withdrawal from an empty treasury instead of returning zero.
    #[serde(default)]
    pub reject_empty_withdrawal: bool,
    /// Port for the `/metrics` HTTP endpoint (serve only).
    pub metrics_port: Option<u16>,
}

impl LedgerConfig {
    pub fn identity(&self) -> LedgerIdentity {
        LedgerIdentity {
            administrator: AccountId::new(self.administrator.clone()),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
        }
    }

    pub fn options(&self) -> LedgerOptions {
        LedgerOptions {
            queue_capacity: self.queue_capacity,
            reject_empty_withdrawal: self.reject_empty_withdrawal,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub path: String,
}
