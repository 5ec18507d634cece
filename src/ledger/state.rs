//! Composed ledger state and the plan/apply split.
//!
//! Every mutation is validated by a `plan_*` method that reads the current
//! state and returns a [`Commit`] describing the complete effect. Only
//! [`LedgerState::apply`] mutates, and it cannot fail: a rejected operation
//! never gets as far as a commit, so there is no partial state to undo.
//!
//! All collections are `im` persistent structures, so cloning a state for a
//! read snapshot is O(1).

use super::membership::MembershipLedger;
use super::profiles::ProfileStore;
use super::registry::ChannelRegistry;
use super::treasury::Treasury;
use super::types::{AccountId, Amount, Channel, ChannelId, MembershipToken, Profile, TokenId};
use crate::error::{LedgerError, LedgerResult};
use crate::store::StoredLedger;

/// A validated paid join: the token to mint and the treasury afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub token: MembershipToken,
    pub paid: Amount,
    pub treasury: Treasury,
}

/// A validated withdrawal: what leaves and the treasury afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub recipient: AccountId,
    pub amount: Amount,
    pub treasury: Treasury,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub account: AccountId,
    pub profile: Profile,
}

/// The complete, validated effect of one mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    ChannelCreated(Channel),
    MemberAdmitted(Admission),
    TreasuryWithdrawn(Payout),
    ProfileSet(ProfileUpdate),
}

impl Commit {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChannelCreated(_) => "channel_created",
            Self::MemberAdmitted(_) => "member_admitted",
            Self::TreasuryWithdrawn(_) => "treasury_withdrawn",
            Self::ProfileSet(_) => "profile_set",
        }
    }

    /// A commit that changes nothing (an empty withdrawal) is neither
    /// persisted nor applied.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::TreasuryWithdrawn(payout) if payout.amount.is_zero())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    registry: ChannelRegistry,
    membership: MembershipLedger,
    treasury: Treasury,
    profiles: ProfileStore,
}

impl LedgerState {
    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn total_channels(&self) -> u64 {
        self.registry.total()
    }

    pub fn get_channel(&self, id: ChannelId) -> LedgerResult<Channel> {
        self.registry.get(id).cloned()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.registry.iter().cloned().collect()
    }

    pub fn has_joined(&self, channel_id: ChannelId, account: &AccountId) -> bool {
        self.membership.has_joined(channel_id, account)
    }

    pub fn total_supply(&self) -> u64 {
        self.membership.total_supply()
    }

    pub fn token(&self, id: TokenId) -> LedgerResult<MembershipToken> {
        self.membership.token(id).cloned()
    }

    pub fn owner_of(&self, id: TokenId) -> LedgerResult<AccountId> {
        self.membership.token(id).map(|t| t.owner.clone())
    }

    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.membership.balance_of(account)
    }

    pub fn profile(&self, account: &AccountId) -> Profile {
        self.profiles.get(account)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn treasury(&self) -> Treasury {
        self.treasury
    }

    // ------------------------------------------------------------------
    // Plans
    // ------------------------------------------------------------------

    pub fn plan_create_channel(
        &self,
        administrator: &AccountId,
        caller: &AccountId,
        name: &str,
        price: Amount,
    ) -> LedgerResult<Channel> {
        if caller != administrator {
            return Err(LedgerError::Unauthorized(caller.clone()));
        }
        self.registry.plan_create(name, price)
    }

    pub fn plan_join(
        &self,
        channel_id: ChannelId,
        account: &AccountId,
        paid: Amount,
    ) -> LedgerResult<Admission> {
        let token = self
            .membership
            .plan_admit(&self.registry, channel_id, account, paid)?;
        let treasury = self.treasury.credited(paid)?;
        Ok(Admission {
            token,
            paid,
            treasury,
        })
    }

    pub fn plan_withdraw(
        &self,
        administrator: &AccountId,
        caller: &AccountId,
        reject_empty: bool,
    ) -> LedgerResult<Payout> {
        if caller != administrator {
            return Err(LedgerError::Unauthorized(caller.clone()));
        }
        if reject_empty && self.treasury.balance.is_zero() {
            return Err(LedgerError::NothingToWithdraw);
        }
        let (treasury, amount) = self.treasury.drained()?;
        Ok(Payout {
            recipient: administrator.clone(),
            amount,
            treasury,
        })
    }

    pub fn plan_set_profile(
        &self,
        account: &AccountId,
        name: &str,
        bio: &str,
        avatar_url: &str,
    ) -> LedgerResult<ProfileUpdate> {
        let profile = self.profiles.plan_set(name, bio, avatar_url)?;
        Ok(ProfileUpdate {
            account: account.clone(),
            profile,
        })
    }

    // ------------------------------------------------------------------
    // Apply
    // ------------------------------------------------------------------

    /// Install a planned commit. Must only be given commits planned against
    /// this exact state.
    pub fn apply(&mut self, commit: Commit) {
        match commit {
            Commit::ChannelCreated(channel) => self.registry.insert(channel),
            Commit::MemberAdmitted(admission) => {
                self.membership.mint(admission.token);
                self.treasury = admission.treasury;
            }
            Commit::TreasuryWithdrawn(payout) => self.treasury = payout.treasury,
            Commit::ProfileSet(update) => self.profiles.upsert(update.account, update.profile),
        }
    }

    // ------------------------------------------------------------------
    // Restore & audit
    // ------------------------------------------------------------------

    /// Rebuild state from persisted rows, rejecting anything that breaks a
    /// ledger invariant.
    pub fn restore(stored: StoredLedger) -> LedgerResult<Self> {
        let registry = ChannelRegistry::restore(stored.channels)?;
        let membership = MembershipLedger::restore(stored.tokens, &registry)?;
        let profiles = ProfileStore::restore(stored.profiles)?;
        let state = Self {
            registry,
            membership,
            treasury: stored.treasury,
            profiles,
        };
        state.verify()?;
        Ok(state)
    }

    /// Check every structural invariant of the ledger.
    pub fn verify(&self) -> LedgerResult<()> {
        let corrupt = |msg: String| Err(LedgerError::Corrupt(msg));

        for (i, channel) in self.registry.iter().enumerate() {
            if channel.id.get() != i as u64 + 1 {
                return corrupt(format!("channel id {} at position {}", channel.id, i + 1));
            }
        }

        for (i, token) in self.membership.tokens().enumerate() {
            if token.id.get() != i as u64 + 1 {
                return corrupt(format!("token id {} at position {}", token.id, i + 1));
            }
            if !self.registry.contains(token.channel_id) {
                return corrupt(format!(
                    "token {} references unknown channel {}",
                    token.id, token.channel_id
                ));
            }
            if !self.membership.has_joined(token.channel_id, &token.owner) {
                return corrupt(format!("token {} has no admission record", token.id));
            }
        }

        if self.membership.admission_count() as u64 != self.membership.total_supply() {
            return corrupt(format!(
                "{} admissions but total supply {}",
                self.membership.admission_count(),
                self.membership.total_supply()
            ));
        }
        if self.membership.held_total() != self.membership.total_supply() {
            return corrupt(format!(
                "{} tokens held, supply {}",
                self.membership.held_total(),
                self.membership.total_supply()
            ));
        }
        if !self.treasury.is_conserved() {
            return corrupt(format!(
                "treasury balance {} != collected {} - withdrawn {}",
                self.treasury.balance, self.treasury.collected, self.treasury.withdrawn
            ));
        }
        Ok(())
    }
}
