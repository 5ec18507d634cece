//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Largest decimals value whose `10^decimals` still fits an amount.
const MAX_DECIMALS: u32 = 38;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ledger.administrator is required")]
    MissingAdministrator,
    #[error("ledger.name is required")]
    MissingName,
    #[error("ledger.symbol is required")]
    MissingSymbol,
    #[error("ledger.decimals must be at most 38, got {0}")]
    DecimalsTooLarge(u32),
    #[error("ledger.queue_capacity must be greater than zero")]
    ZeroQueueCapacity,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let ledger = &config.ledger;

    if ledger.administrator.trim().is_empty() {
        errors.push(ValidationError::MissingAdministrator);
    }
    if ledger.name.is_empty() {
        errors.push(ValidationError::MissingName);
    }
    if ledger.symbol.is_empty() {
        errors.push(ValidationError::MissingSymbol);
    }
    if ledger.decimals > MAX_DECIMALS {
        errors.push(ValidationError::DecimalsTooLarge(ledger.decimals));
    }
    if ledger.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }

    // Database path validation
    if let Some(ref db) = config.database {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
