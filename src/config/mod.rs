//! Configuration loading and management.
//!
//! - [`types`]: Config struct definitions and loading
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup checks that report every problem at once

mod defaults;
mod types;
pub mod validation;

pub use types::{Config, ConfigError, DatabaseConfig, LedgerConfig};
pub use validation::{ValidationError, validate};
