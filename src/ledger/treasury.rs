//! Treasury accounting.
//!
//! `balance` is what the ledger currently holds. `collected` and `withdrawn`
//! are lifetime totals kept so conservation can be checked at any time:
//! `balance == collected - withdrawn`.

use super::types::Amount;
use crate::error::{LedgerError, LedgerResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Treasury {
    pub balance: Amount,
    pub collected: Amount,
    pub withdrawn: Amount,
}

impl Treasury {
    /// Treasury after accepting `paid`.
    pub fn credited(&self, paid: Amount) -> LedgerResult<Treasury> {
        Ok(Treasury {
            balance: self.balance.checked_add(paid).ok_or(LedgerError::Overflow)?,
            collected: self
                .collected
                .checked_add(paid)
                .ok_or(LedgerError::Overflow)?,
            withdrawn: self.withdrawn,
        })
    }

    /// Treasury after sweeping the whole balance, plus the amount swept.
    pub fn drained(&self) -> LedgerResult<(Treasury, Amount)> {
        let amount = self.balance;
        let next = Treasury {
            balance: Amount::ZERO,
            collected: self.collected,
            withdrawn: self
                .withdrawn
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?,
        };
        Ok((next, amount))
    }

    pub fn is_conserved(&self) -> bool {
        self.collected.checked_sub(self.withdrawn) == Some(self.balance)
    }
}
