//! Membership ledger.
//!
//! Turns a paid join into exactly one membership token. Three views are kept
//! in step on every mint:
//! - the admission set, keyed by `(channel, account)`;
//! - the token table, indexed by `token_id - 1` in mint order;
//! - per-account holdings, for `balance_of`.

use super::registry::ChannelRegistry;
use super::types::{AccountId, Amount, ChannelId, MembershipToken, TokenId};
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Default)]
pub struct MembershipLedger {
    admissions: im::HashMap<(ChannelId, AccountId), TokenId>,
    tokens: im::Vector<MembershipToken>,
    holdings: im::HashMap<AccountId, u64>,
}

impl MembershipLedger {
    pub fn total_supply(&self) -> u64 {
        self.tokens.len() as u64
    }

    pub fn admission_count(&self) -> usize {
        self.admissions.len()
    }

    pub fn has_joined(&self, channel_id: ChannelId, account: &AccountId) -> bool {
        self.admissions
            .contains_key(&(channel_id, account.clone()))
    }

    pub fn token(&self, id: TokenId) -> LedgerResult<&MembershipToken> {
        if id.get() == 0 || id.get() > self.total_supply() {
            return Err(LedgerError::TokenNotFound(id));
        }
        self.tokens
            .get((id.get() - 1) as usize)
            .ok_or(LedgerError::TokenNotFound(id))
    }

    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.holdings.get(account).copied().unwrap_or(0)
    }

    /// Sum of every account's holdings. Equals the supply while the views
    /// are in step.
    pub fn held_total(&self) -> u64 {
        self.holdings.values().sum()
    }

    #[cfg(test)]
    pub(crate) fn drop_holding(&mut self, account: &AccountId) {
        self.holdings.remove(account);
    }

    pub fn tokens(&self) -> impl Iterator<Item = &MembershipToken> {
        self.tokens.iter()
    }

    /// Validate a join in rule order and assign the next token id.
    ///
    /// Rule order: channel range, duplicate admission, payment.
    pub fn plan_admit(
        &self,
        registry: &ChannelRegistry,
        channel_id: ChannelId,
        account: &AccountId,
        paid: Amount,
    ) -> LedgerResult<MembershipToken> {
        if !registry.contains(channel_id) {
            return Err(LedgerError::InvalidChannel(channel_id));
        }
        if self.has_joined(channel_id, account) {
            return Err(LedgerError::AlreadyJoined {
                channel_id,
                account: account.clone(),
            });
        }
        let price = registry.get(channel_id)?.price;
        if paid < price {
            return Err(LedgerError::InsufficientPayment { price, paid });
        }

        let next = self
            .total_supply()
            .checked_add(1)
            .ok_or(LedgerError::Overflow)?;
        Ok(MembershipToken {
            id: TokenId(next),
            owner: account.clone(),
            channel_id,
        })
    }

    /// Record a planned token: admission, ownership and supply move together.
    pub(crate) fn mint(&mut self, token: MembershipToken) {
        debug_assert_eq!(token.id.get(), self.total_supply() + 1);
        self.admissions
            .insert((token.channel_id, token.owner.clone()), token.id);
        *self.holdings.entry(token.owner.clone()).or_insert(0) += 1;
        self.tokens.push_back(token);
    }

    /// Rebuild from persisted tokens, checking every ledger invariant.
    pub(crate) fn restore(
        mut rows: Vec<MembershipToken>,
        registry: &ChannelRegistry,
    ) -> LedgerResult<Self> {
        rows.sort_by_key(|t| t.id);
        let mut ledger = Self::default();
        for token in rows {
            if token.id.get() != ledger.total_supply() + 1 {
                return Err(LedgerError::Corrupt(format!(
                    "token id {} out of sequence (expected {})",
                    token.id,
                    ledger.total_supply() + 1
                )));
            }
            if !registry.contains(token.channel_id) {
                return Err(LedgerError::Corrupt(format!(
                    "token {} references unknown channel {}",
                    token.id, token.channel_id
                )));
            }
            if ledger.has_joined(token.channel_id, &token.owner) {
                return Err(LedgerError::Corrupt(format!(
                    "duplicate admission of {} to channel {}",
                    token.owner, token.channel_id
                )));
            }
            ledger.mint(token);
        }
        Ok(ledger)
    }
}
