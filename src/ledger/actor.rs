//! The single ledger writer.
//!
//! `LedgerActor` owns the authoritative [`LedgerState`] in its own Tokio task
//! and processes [`LedgerEvent`]s strictly one at a time, so every mutation
//! is linearized. For each event it plans, persists, applies and finally
//! publishes a fresh snapshot for readers. A rejected plan or a failed
//! persist leaves both the store and the published snapshot untouched.

use super::state::{Commit, LedgerState};
use super::types::{AccountId, Amount, ChannelId, LedgerIdentity, TokenId};
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, info, warn};

/// Requests accepted by the writer. Every variant carries its reply channel.
#[derive(Debug)]
pub enum LedgerEvent {
    CreateChannel {
        caller: AccountId,
        name: String,
        price: Amount,
        reply_tx: oneshot::Sender<LedgerResult<ChannelId>>,
    },
    Join {
        channel_id: ChannelId,
        account: AccountId,
        paid: Amount,
        reply_tx: oneshot::Sender<LedgerResult<TokenId>>,
    },
    Withdraw {
        caller: AccountId,
        reply_tx: oneshot::Sender<LedgerResult<Amount>>,
    },
    SetProfile {
        account: AccountId,
        name: String,
        bio: String,
        avatar_url: String,
        reply_tx: oneshot::Sender<LedgerResult<()>>,
    },
}

pub struct LedgerActor {
    identity: Arc<LedgerIdentity>,
    state: LedgerState,
    store: Arc<dyn LedgerStore>,
    published: Arc<RwLock<Arc<LedgerState>>>,
    reject_empty_withdrawal: bool,
}

impl LedgerActor {
    /// Spawn the writer over `state` and return its queue.
    ///
    /// `published` must already hold a snapshot of `state`.
    pub fn spawn(
        identity: Arc<LedgerIdentity>,
        state: LedgerState,
        store: Arc<dyn LedgerStore>,
        published: Arc<RwLock<Arc<LedgerState>>>,
        queue_capacity: usize,
        reject_empty_withdrawal: bool,
    ) -> mpsc::Sender<LedgerEvent> {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let span = crate::telemetry::spans::writer(&identity.name, &identity.symbol);

        let actor = Self {
            identity,
            state,
            store,
            published,
            reject_empty_withdrawal,
        };

        tokio::spawn(actor.run(rx).instrument(span));

        tx
    }

    /// The main writer loop. Ends once every `Ledger` handle is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<LedgerEvent>) {
        info!("Ledger writer started");
        while let Some(event) = rx.recv().await {
            self.handle_event(event).await;
        }
        info!("Ledger writer stopped");
    }

    async fn handle_event(&mut self, event: LedgerEvent) {
        match event {
            LedgerEvent::CreateChannel {
                caller,
                name,
                price,
                reply_tx,
            } => {
                let plan = self
                    .state
                    .plan_create_channel(&self.identity.administrator, &caller, &name, price)
                    .map(|channel| (channel.id, Commit::ChannelCreated(channel)));
                let result = self.commit(plan).await;
                let _ = reply_tx.send(result);
            }
            LedgerEvent::Join {
                channel_id,
                account,
                paid,
                reply_tx,
            } => {
                let plan = self
                    .state
                    .plan_join(channel_id, &account, paid)
                    .map(|admission| (admission.token.id, Commit::MemberAdmitted(admission)));
                let result = self.commit(plan).await;
                let _ = reply_tx.send(result);
            }
            LedgerEvent::Withdraw { caller, reply_tx } => {
                let plan = self
                    .state
                    .plan_withdraw(
                        &self.identity.administrator,
                        &caller,
                        self.reject_empty_withdrawal,
                    )
                    .map(|payout| (payout.amount, Commit::TreasuryWithdrawn(payout)));
                let result = self.commit(plan).await;
                let _ = reply_tx.send(result);
            }
            LedgerEvent::SetProfile {
                account,
                name,
                bio,
                avatar_url,
                reply_tx,
            } => {
                let plan = self
                    .state
                    .plan_set_profile(&account, &name, &bio, &avatar_url)
                    .map(|update| ((), Commit::ProfileSet(update)));
                let result = self.commit(plan).await;
                let _ = reply_tx.send(result);
            }
        }
    }

    /// Persist, apply and publish a planned commit, yielding the caller's
    /// reply value once all three have happened.
    async fn commit<T>(&mut self, plan: LedgerResult<(T, Commit)>) -> LedgerResult<T> {
        let (reply, commit) = match plan {
            Ok(planned) => planned,
            Err(e) => {
                debug!(error = %e, "Operation rejected");
                return Err(e);
            }
        };

        if commit.is_noop() {
            debug!(kind = commit.kind(), "Nothing to commit");
            return Ok(reply);
        }

        if let Err(e) = self.store.persist(&commit).await {
            warn!(kind = commit.kind(), error = %e, "Failed to persist commit");
            return Err(LedgerError::from(e));
        }

        log_commit(&commit);
        self.state.apply(commit);
        self.publish();
        Ok(reply)
    }

    fn publish(&self) {
        let snapshot = Arc::new(self.state.clone());
        crate::metrics::observe_state(&snapshot);
        *self.published.write() = snapshot;
    }
}

fn log_commit(commit: &Commit) {
    match commit {
        Commit::ChannelCreated(channel) => {
            info!(channel_id = %channel.id, name = %channel.name, price = %channel.price, "Channel created");
        }
        Commit::MemberAdmitted(admission) => {
            info!(
                token_id = %admission.token.id,
                channel_id = %admission.token.channel_id,
                account = %admission.token.owner,
                paid = %admission.paid,
                "Member admitted"
            );
        }
        Commit::TreasuryWithdrawn(payout) => {
            info!(recipient = %payout.recipient, amount = %payout.amount, "Treasury withdrawn");
        }
        Commit::ProfileSet(update) => {
            debug!(account = %update.account, "Profile updated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::store::{NoOpStore, StoreError, StoredLedger};
    use async_trait::async_trait;

    /// A store whose every write fails.
    struct BrokenStore;

    #[async_trait]
    impl LedgerStore for BrokenStore {
        async fn open(&self, _: &LedgerIdentity) -> Result<StoredLedger, StoreError> {
            Ok(StoredLedger::default())
        }

        async fn persist(&self, _: &Commit) -> Result<(), StoreError> {
            Err(StoreError::Database(DbError::Internal("disk full".into())))
        }
    }

    fn identity() -> Arc<LedgerIdentity> {
        Arc::new(LedgerIdentity {
            administrator: AccountId::from("admin"),
            name: "Dappcord".into(),
            symbol: "DC".into(),
        })
    }

    fn spawn(store: Arc<dyn LedgerStore>) -> (mpsc::Sender<LedgerEvent>, Arc<RwLock<Arc<LedgerState>>>) {
        let published = Arc::new(RwLock::new(Arc::new(LedgerState::default())));
        let tx = LedgerActor::spawn(
            identity(),
            LedgerState::default(),
            store,
            published.clone(),
            8,
            false,
        );
        (tx, published)
    }

    async fn create(tx: &mpsc::Sender<LedgerEvent>, caller: &str) -> LedgerResult<ChannelId> {
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(LedgerEvent::CreateChannel {
            caller: AccountId::from(caller),
            name: "general".into(),
            price: Amount::new(10),
            reply_tx,
        })
        .await
        .unwrap();
        reply_rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_commit_is_published() {
        let (tx, published) = spawn(Arc::new(NoOpStore));
        assert_eq!(create(&tx, "admin").await, Ok(ChannelId(1)));
        assert_eq!(published.read().total_channels(), 1);
    }

    #[tokio::test]
    async fn test_rejection_is_not_published() {
        let (tx, published) = spawn(Arc::new(NoOpStore));
        assert!(matches!(
            create(&tx, "mallory").await,
            Err(LedgerError::Unauthorized(_))
        ));
        assert_eq!(published.read().total_channels(), 0);
    }

    #[tokio::test]
    async fn test_persist_failure_leaves_state_unchanged() {
        let (tx, published) = spawn(Arc::new(BrokenStore));
        assert!(matches!(
            create(&tx, "admin").await,
            Err(LedgerError::Storage(_))
        ));
        assert_eq!(published.read().total_channels(), 0);

        // The next id is still 1: nothing was applied.
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(LedgerEvent::Join {
            channel_id: ChannelId(1),
            account: AccountId::from("alice"),
            paid: Amount::new(10),
            reply_tx,
        })
        .await
        .unwrap();
        assert_eq!(
            reply_rx.await.unwrap(),
            Err(LedgerError::InvalidChannel(ChannelId(1)))
        );
    }
}
