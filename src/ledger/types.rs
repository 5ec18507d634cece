//! Core ledger value types.
//!
//! Identifiers are thin newtypes so a channel id can never be passed where a
//! token id is expected. Amounts are unsigned integers in the smallest value
//! unit; there is no floating point anywhere in the value path.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable identifier of an external caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Sequential channel identifier. Valid ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl ChannelId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential membership token identifier, assigned in global mint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl TokenId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from parsing an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid digit in amount: {0}")]
    InvalidDigit(String),
    #[error("amount has more than {0} fractional digits")]
    TooPrecise(u32),
    #[error("amount out of range")]
    Overflow,
}

/// A non-negative value in the smallest unit.
///
/// Serialized as a decimal string of smallest units: JSON numbers cannot
/// carry the full u128 range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// `whole * 10^decimals`, e.g. `Amount::whole(1, 18)` is one ether in wei.
    pub fn whole(whole: u128, decimals: u32) -> Option<Amount> {
        10u128
            .checked_pow(decimals)
            .and_then(|scale| whole.checked_mul(scale))
            .map(Amount)
    }

    /// Parse a decimal string such as `"0.5"` into smallest units.
    ///
    /// Fractional digits beyond `decimals` are rejected, never truncated.
    pub fn parse_decimal(s: &str, decimals: u32) -> Result<Amount, AmountError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(AmountError::Empty);
        }
        if frac_part.len() > decimals as usize {
            return Err(AmountError::TooPrecise(decimals));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(AmountError::InvalidDigit(s.to_string()));
        }

        let scale = 10u128.checked_pow(decimals).ok_or(AmountError::Overflow)?;
        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| AmountError::Overflow)?
        };

        let mut frac: u128 = 0;
        if !frac_part.is_empty() {
            let padding = decimals - frac_part.len() as u32;
            let digits: u128 = frac_part.parse().map_err(|_| AmountError::Overflow)?;
            frac = digits
                .checked_mul(10u128.pow(padding))
                .ok_or(AmountError::Overflow)?;
        }

        whole
            .checked_mul(scale)
            .and_then(|w| w.checked_add(frac))
            .map(Amount)
            .ok_or(AmountError::Overflow)
    }

    /// Render with a decimal point, trimming trailing zeros.
    pub fn to_decimal_string(self, decimals: u32) -> String {
        let Some(scale) = 10u128.checked_pow(decimals) else {
            return self.0.to_string();
        };
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a plain integer count of smallest units (the storage format).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse_decimal(s, 0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A named, priced admission gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub price: Amount,
}

/// Proof of admission to one channel, owned by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipToken {
    pub id: TokenId,
    pub owner: AccountId,
    pub channel_id: ChannelId,
}

/// Self-describing account profile. The default is the empty profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub bio: String,
    pub avatar_url: String,
}

/// Identity fixed when a ledger is constructed; never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIdentity {
    pub administrator: AccountId,
    pub name: String,
    pub symbol: String,
}
