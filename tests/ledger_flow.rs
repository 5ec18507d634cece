//! Integration tests for the core ledger flows: channel creation, paid
//! admission, treasury withdrawal and profiles.

mod common;

use chanledger::LedgerError;
use chanledger::ledger::{Amount, Channel, ChannelId, Profile, TokenId};
use common::{account, deployer, ledger_with_general, memory_ledger, tokens, units};

#[tokio::test]
async fn test_create_channel() {
    let ledger = memory_ledger();
    let id = ledger
        .create_channel(&deployer(), "general", tokens(1))
        .await
        .unwrap();

    assert_eq!(id, ChannelId(1));
    assert_eq!(ledger.total_channels(), 1);
    assert_eq!(
        ledger.get_channel(ChannelId(1)).unwrap(),
        Channel {
            id: ChannelId(1),
            name: "general".into(),
            price: tokens(1),
        }
    );
}

#[tokio::test]
async fn test_join_mints_and_collects() {
    let ledger = ledger_with_general().await;
    let alice = account("alice");

    let token_id = ledger.join(ChannelId(1), &alice, tokens(1)).await.unwrap();

    assert_eq!(token_id, TokenId(1));
    assert!(ledger.has_joined(ChannelId(1), &alice));
    assert_eq!(ledger.total_supply(), 1);
    assert_eq!(ledger.treasury_balance(), tokens(1));
    assert_eq!(ledger.owner_of(TokenId(1)).unwrap(), alice);
    assert_eq!(ledger.balance_of(&alice), 1);
}

#[tokio::test]
async fn test_join_channel_zero_is_invalid() {
    let ledger = ledger_with_general().await;
    assert_eq!(
        ledger.join(ChannelId(0), &account("anyone"), tokens(1)).await,
        Err(LedgerError::InvalidChannel(ChannelId(0)))
    );
    assert_eq!(ledger.total_supply(), 0);
}

#[tokio::test]
async fn test_join_past_last_channel_is_invalid() {
    let ledger = ledger_with_general().await;
    assert_eq!(
        ledger.join(ChannelId(2), &account("anyone"), tokens(1)).await,
        Err(LedgerError::InvalidChannel(ChannelId(2)))
    );
}

#[tokio::test]
async fn test_second_join_rejected() {
    let ledger = ledger_with_general().await;
    let alice = account("alice");

    ledger.join(ChannelId(1), &alice, tokens(1)).await.unwrap();
    let before = ledger.snapshot();

    let second = ledger.join(ChannelId(1), &alice, tokens(1)).await;
    assert_eq!(
        second,
        Err(LedgerError::AlreadyJoined {
            channel_id: ChannelId(1),
            account: alice.clone(),
        })
    );

    let after = ledger.snapshot();
    assert_eq!(after.channels(), before.channels());
    assert_eq!(after.total_supply(), before.total_supply());
    assert_eq!(after.token(TokenId(1)), before.token(TokenId(1)));
    assert_eq!(after.token(TokenId(2)), Err(LedgerError::TokenNotFound(TokenId(2))));
    assert!(after.has_joined(ChannelId(1), &alice));
    assert_eq!(after.balance_of(&alice), before.balance_of(&alice));
    assert_eq!(after.treasury(), before.treasury());
}

#[tokio::test]
async fn test_underpayment_rejected() {
    let ledger = ledger_with_general().await;
    let bob = account("bob");

    assert_eq!(
        ledger.join(ChannelId(1), &bob, units("0.5")).await,
        Err(LedgerError::InsufficientPayment {
            price: tokens(1),
            paid: units("0.5"),
        })
    );
    assert!(!ledger.has_joined(ChannelId(1), &bob));
    assert!(ledger.treasury_balance().is_zero());
}

#[tokio::test]
async fn test_overpayment_then_withdraw() {
    let ledger = ledger_with_general().await;

    ledger
        .join(ChannelId(1), &account("alice"), tokens(10))
        .await
        .unwrap();
    assert_eq!(ledger.treasury_balance(), tokens(10));

    let moved = ledger.withdraw(&deployer()).await.unwrap();
    assert_eq!(moved, tokens(10));
    assert!(ledger.treasury_balance().is_zero());

    let treasury = ledger.treasury();
    assert_eq!(treasury.collected, tokens(10));
    assert_eq!(treasury.withdrawn, tokens(10));
}

#[tokio::test]
async fn test_rejected_join_can_be_retried() {
    let ledger = ledger_with_general().await;
    let bob = account("bob");

    assert!(ledger.join(ChannelId(1), &bob, units("0.5")).await.is_err());
    assert_eq!(ledger.join(ChannelId(1), &bob, tokens(1)).await, Ok(TokenId(1)));
}

#[tokio::test]
async fn test_same_account_joins_several_channels() {
    let ledger = ledger_with_general().await;
    ledger
        .create_channel(&deployer(), "jobs", tokens(2))
        .await
        .unwrap();
    let alice = account("alice");

    assert_eq!(ledger.join(ChannelId(1), &alice, tokens(1)).await, Ok(TokenId(1)));
    assert_eq!(ledger.join(ChannelId(2), &alice, tokens(2)).await, Ok(TokenId(2)));

    assert_eq!(ledger.balance_of(&alice), 2);
    assert_eq!(ledger.token(TokenId(2)).unwrap().channel_id, ChannelId(2));
    assert_eq!(ledger.treasury_balance(), tokens(3));
}

#[tokio::test]
async fn test_free_channel_admits_zero_payment() {
    let ledger = memory_ledger();
    ledger
        .create_channel(&deployer(), "lobby", Amount::ZERO)
        .await
        .unwrap();

    assert_eq!(
        ledger.join(ChannelId(1), &account("alice"), Amount::ZERO).await,
        Ok(TokenId(1))
    );
    assert!(ledger.treasury_balance().is_zero());
}

#[tokio::test]
async fn test_non_admin_cannot_create_or_withdraw() {
    let ledger = ledger_with_general().await;
    let mallory = account("mallory");
    ledger
        .join(ChannelId(1), &account("alice"), tokens(1))
        .await
        .unwrap();

    assert_eq!(
        ledger.create_channel(&mallory, "scam", tokens(1)).await,
        Err(LedgerError::Unauthorized(mallory.clone()))
    );
    assert_eq!(
        ledger.withdraw(&mallory).await,
        Err(LedgerError::Unauthorized(mallory))
    );
    assert_eq!(ledger.total_channels(), 1);
    assert_eq!(ledger.treasury_balance(), tokens(1));
}

#[tokio::test]
async fn test_empty_channel_name_rejected() {
    let ledger = memory_ledger();
    assert_eq!(
        ledger.create_channel(&deployer(), "", tokens(1)).await,
        Err(LedgerError::InvalidChannelName)
    );
    assert_eq!(ledger.total_channels(), 0);
}

#[tokio::test]
async fn test_missing_reads() {
    let ledger = ledger_with_general().await;
    assert_eq!(
        ledger.get_channel(ChannelId(0)),
        Err(LedgerError::NotFound(ChannelId(0)))
    );
    assert_eq!(
        ledger.get_channel(ChannelId(2)),
        Err(LedgerError::NotFound(ChannelId(2)))
    );
    assert_eq!(
        ledger.token(TokenId(1)),
        Err(LedgerError::TokenNotFound(TokenId(1)))
    );
    assert!(!ledger.has_joined(ChannelId(7), &account("alice")));
}

#[tokio::test]
async fn test_channels_listed_in_order() {
    let ledger = memory_ledger();
    for name in ["general", "intro", "jobs"] {
        ledger
            .create_channel(&deployer(), name, tokens(1))
            .await
            .unwrap();
    }
    let names: Vec<_> = ledger.channels().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["general", "intro", "jobs"]);
}

#[tokio::test]
async fn test_profiles() {
    let ledger = memory_ledger();
    let alice = account("alice");

    assert_eq!(ledger.get_profile(&alice), Profile::default());

    ledger
        .set_profile(&alice, "Alice", "Crypto enthusiast", "https://example.com/avatar.png")
        .await
        .unwrap();
    ledger
        .set_profile(&alice, "Alice Updated", "New bio", "")
        .await
        .unwrap();

    let profile = ledger.get_profile(&alice);
    assert_eq!(profile.name, "Alice Updated");
    assert_eq!(profile.bio, "New bio");
    assert_eq!(profile.avatar_url, "");

    assert!(matches!(
        ledger.set_profile(&alice, "", "bio", "url").await,
        Err(LedgerError::InvalidProfile(_))
    ));
    assert_eq!(ledger.get_profile(&alice).name, "Alice Updated");
}

#[tokio::test]
async fn test_collection_identity() {
    let ledger = memory_ledger();
    assert_eq!(ledger.name(), "Dappcord");
    assert_eq!(ledger.symbol(), "DC");
    assert_eq!(ledger.administrator(), &deployer());
}
