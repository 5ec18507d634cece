//! The token-gated channel ledger.
//!
//! [`Ledger`] is the public handle. It is cheap to clone and safe to share
//! across tasks:
//!
//! - Mutations (`create_channel`, `join`, `withdraw`, `set_profile`) are
//!   queued to a single [`LedgerActor`] and resolve once the outcome is
//!   durable and visible.
//! - Reads are synchronous and served from the latest published snapshot.
//!   A snapshot is internally consistent: it reflects every operation up to
//!   some point and none after it.

mod actor;
mod membership;
mod profiles;
mod registry;
mod state;
mod treasury;
mod types;

pub use actor::{LedgerActor, LedgerEvent};
pub use membership::MembershipLedger;
pub use profiles::ProfileStore;
pub use registry::ChannelRegistry;
pub use state::{Admission, Commit, LedgerState, Payout, ProfileUpdate};
pub use treasury::Treasury;
pub use types::{
    AccountId, Amount, AmountError, Channel, ChannelId, LedgerIdentity, MembershipToken, Profile,
    TokenId,
};

use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerStore, NoOpStore};
use crate::telemetry::{OperationTimer, spans};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

/// Writer tuning that is not part of the ledger's identity.
#[derive(Debug, Clone, Copy)]
pub struct LedgerOptions {
    /// Bound of the writer's request queue.
    pub queue_capacity: usize,
    /// Reject a withdrawal from an empty treasury instead of returning zero.
    pub reject_empty_withdrawal: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            reject_empty_withdrawal: false,
        }
    }
}

#[derive(Clone)]
pub struct Ledger {
    tx: mpsc::Sender<LedgerEvent>,
    snapshot: Arc<RwLock<Arc<LedgerState>>>,
    identity: Arc<LedgerIdentity>,
}

impl Ledger {
    /// Load the ledger from `store` and start its writer.
    ///
    /// Fails if the stored identity differs from `identity` or the stored
    /// rows break a ledger invariant.
    pub async fn open(
        identity: LedgerIdentity,
        options: LedgerOptions,
        store: Arc<dyn LedgerStore>,
    ) -> LedgerResult<Self> {
        let stored = store.open(&identity).await?;
        let state = LedgerState::restore(stored)?;
        Ok(Self::start(identity, options, state, store))
    }

    /// A fresh ledger with no persistence.
    pub fn in_memory(identity: LedgerIdentity, options: LedgerOptions) -> Self {
        Self::start(identity, options, LedgerState::default(), Arc::new(NoOpStore))
    }

    fn start(
        identity: LedgerIdentity,
        options: LedgerOptions,
        state: LedgerState,
        store: Arc<dyn LedgerStore>,
    ) -> Self {
        let identity = Arc::new(identity);
        let initial = Arc::new(state.clone());
        crate::metrics::observe_state(&initial);
        let snapshot = Arc::new(RwLock::new(initial));

        let tx = LedgerActor::spawn(
            identity.clone(),
            state,
            store,
            snapshot.clone(),
            options.queue_capacity.max(1),
            options.reject_empty_withdrawal,
        );

        Self {
            tx,
            snapshot,
            identity,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a channel. Administrator only.
    pub async fn create_channel(
        &self,
        caller: &AccountId,
        name: &str,
        price: Amount,
    ) -> LedgerResult<ChannelId> {
        let timer = OperationTimer::new("create_channel");
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = LedgerEvent::CreateChannel {
            caller: caller.clone(),
            name: name.to_string(),
            price,
            reply_tx,
        };
        self.request(&timer, event, reply_rx)
            .instrument(spans::operation(timer.operation(), caller.as_str()))
            .await
    }

    /// Pay `paid` to join `channel_id`, minting a membership token.
    pub async fn join(
        &self,
        channel_id: ChannelId,
        account: &AccountId,
        paid: Amount,
    ) -> LedgerResult<TokenId> {
        let timer = OperationTimer::new("join");
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = LedgerEvent::Join {
            channel_id,
            account: account.clone(),
            paid,
            reply_tx,
        };
        self.request(&timer, event, reply_rx)
            .instrument(spans::operation(timer.operation(), account.as_str()))
            .await
    }

    /// Transfer the whole treasury balance to the administrator and return
    /// the amount moved. Administrator only.
    pub async fn withdraw(&self, caller: &AccountId) -> LedgerResult<Amount> {
        let timer = OperationTimer::new("withdraw");
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = LedgerEvent::Withdraw {
            caller: caller.clone(),
            reply_tx,
        };
        self.request(&timer, event, reply_rx)
            .instrument(spans::operation(timer.operation(), caller.as_str()))
            .await
    }

    pub async fn set_profile(
        &self,
        account: &AccountId,
        name: &str,
        bio: &str,
        avatar_url: &str,
    ) -> LedgerResult<()> {
        let timer = OperationTimer::new("set_profile");
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = LedgerEvent::SetProfile {
            account: account.clone(),
            name: name.to_string(),
            bio: bio.to_string(),
            avatar_url: avatar_url.to_string(),
            reply_tx,
        };
        self.request(&timer, event, reply_rx)
            .instrument(spans::operation(timer.operation(), account.as_str()))
            .await
    }

    async fn request<T>(
        &self,
        timer: &OperationTimer,
        event: LedgerEvent,
        reply_rx: oneshot::Receiver<LedgerResult<T>>,
    ) -> LedgerResult<T> {
        let result = match self.tx.send(event).await {
            Ok(()) => reply_rx.await.unwrap_or(Err(LedgerError::Unavailable)),
            Err(_) => Err(LedgerError::Unavailable),
        };
        if let Err(e) = &result {
            crate::metrics::record_operation_error(timer.operation(), e.error_code());
        }
        result
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The latest published state. Hold on to it to make several reads
    /// against the same point in time.
    pub fn snapshot(&self) -> Arc<LedgerState> {
        self.snapshot.read().clone()
    }

    pub fn identity(&self) -> &LedgerIdentity {
        &self.identity
    }

    pub fn administrator(&self) -> &AccountId {
        &self.identity.administrator
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn symbol(&self) -> &str {
        &self.identity.symbol
    }

    pub fn total_channels(&self) -> u64 {
        self.snapshot().total_channels()
    }

    pub fn get_channel(&self, id: ChannelId) -> LedgerResult<Channel> {
        self.snapshot().get_channel(id)
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.snapshot().channels()
    }

    pub fn has_joined(&self, channel_id: ChannelId, account: &AccountId) -> bool {
        self.snapshot().has_joined(channel_id, account)
    }

    pub fn total_supply(&self) -> u64 {
        self.snapshot().total_supply()
    }

    pub fn token(&self, id: TokenId) -> LedgerResult<MembershipToken> {
        self.snapshot().token(id)
    }

    pub fn owner_of(&self, id: TokenId) -> LedgerResult<AccountId> {
        self.snapshot().owner_of(id)
    }

    /// Number of membership tokens `account` holds.
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.snapshot().balance_of(account)
    }

    /// The stored profile, or an all-empty one if none was ever set.
    pub fn get_profile(&self, account: &AccountId) -> Profile {
        self.snapshot().profile(account)
    }

    pub fn treasury(&self) -> Treasury {
        self.snapshot().treasury()
    }

    pub fn treasury_balance(&self) -> Amount {
        self.snapshot().treasury().balance
    }
}
