//! Unified error handling for chanledger.
//!
//! Every rejected ledger operation maps to exactly one [`LedgerError`]
//! variant. Rejections are deterministic and leave the ledger untouched, so
//! none of these are retried internally.

use crate::ledger::{AccountId, Amount, ChannelId, TokenId};
use crate::store::StoreError;
use thiserror::Error;

// ============================================================================
// Ledger Errors (operation outcomes)
// ============================================================================

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0} is not the administrator")]
    Unauthorized(AccountId),

    #[error("invalid channel: {0}")]
    InvalidChannel(ChannelId),

    #[error("{account} has already joined channel {channel_id}")]
    AlreadyJoined {
        channel_id: ChannelId,
        account: AccountId,
    },

    #[error("insufficient payment: channel costs {price}, received {paid}")]
    InsufficientPayment { price: Amount, paid: Amount },

    #[error("invalid profile: {0}")]
    InvalidProfile(&'static str),

    #[error("channel name must not be empty")]
    InvalidChannelName,

    #[error("no such channel: {0}")]
    NotFound(ChannelId),

    #[error("no such token: {0}")]
    TokenNotFound(TokenId),

    #[error("treasury is empty")]
    NothingToWithdraw,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("persisted ledger is corrupt: {0}")]
    Corrupt(String),

    #[error("ledger writer is not running")]
    Unavailable,
}

impl LedgerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidChannel(_) => "invalid_channel",
            Self::AlreadyJoined { .. } => "already_joined",
            Self::InsufficientPayment { .. } => "insufficient_payment",
            Self::InvalidProfile(_) => "invalid_profile",
            Self::InvalidChannelName => "invalid_channel_name",
            Self::NotFound(_) => "not_found",
            Self::TokenNotFound(_) => "token_not_found",
            Self::NothingToWithdraw => "nothing_to_withdraw",
            Self::Overflow => "overflow",
            Self::Storage(_) => "storage",
            Self::Corrupt(_) => "corrupt",
            Self::Unavailable => "unavailable",
        }
    }

    /// Whether the caller sent a request the ledger rules reject, as opposed
    /// to an infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::Storage(_) | Self::Corrupt(_) | Self::Unavailable
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt(msg) => LedgerError::Corrupt(msg),
            other => LedgerError::Storage(other.to_string()),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::Unauthorized(AccountId::from("mallory")).error_code(),
            "unauthorized"
        );
        assert_eq!(
            LedgerError::InvalidChannel(ChannelId(0)).error_code(),
            "invalid_channel"
        );
        assert_eq!(LedgerError::Storage("io".into()).error_code(), "storage");
    }

    #[test]
    fn test_rejection_split() {
        assert!(LedgerError::NothingToWithdraw.is_rejection());
        assert!(
            LedgerError::InsufficientPayment {
                price: Amount::new(2),
                paid: Amount::new(1)
            }
            .is_rejection()
        );
        assert!(!LedgerError::Unavailable.is_rejection());
        assert!(!LedgerError::Storage("disk full".into()).is_rejection());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: LedgerError = StoreError::Corrupt("gap in token ids".into()).into();
        assert_eq!(err, LedgerError::Corrupt("gap in token ids".into()));
    }

    #[test]
    fn test_display() {
        let err = LedgerError::AlreadyJoined {
            channel_id: ChannelId(1),
            account: AccountId::from("alice"),
        };
        assert_eq!(err.to_string(), "alice has already joined channel 1");
    }
}
