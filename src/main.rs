//! chanledger - token-gated community channel ledger.
//!
//! Operator CLI over a single ledger: every subcommand opens the configured
//! store, performs one operation and prints the result as JSON.

mod cli;

use anyhow::Context;
use chanledger::config::{Config, validate};
use chanledger::db::Database;
use chanledger::ledger::{AccountId, Amount, ChannelId, Ledger, TokenId};
use chanledger::store::{LedgerStore, NoOpStore, SqliteStore};
use clap::Parser;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing. Logs go to stderr so stdout stays pure JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config).map_err(|e| {
        error!(path = %cli.config.display(), error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    chanledger::metrics::init();

    let store: Arc<dyn LedgerStore> = match &config.database {
        Some(db) => {
            info!(path = %db.path, "Using SQLite store");
            Arc::new(SqliteStore::new(Database::new(&db.path).await?))
        }
        None => {
            info!("No database configured. Ledger is in-memory only.");
            Arc::new(NoOpStore)
        }
    };

    let ledger = Ledger::open(config.ledger.identity(), config.ledger.options(), store)
        .await
        .context("failed to open ledger")?;

    let decimals = config.ledger.decimals;
    let amount = |s: &str| -> anyhow::Result<Amount> {
        Amount::parse_decimal(s, decimals).with_context(|| format!("invalid amount '{}'", s))
    };
    let show = |a: Amount| a.to_decimal_string(decimals);

    let output: Value = match cli.command {
        Command::CreateChannel {
            caller,
            name,
            price,
        } => {
            let id = ledger
                .create_channel(&AccountId::new(caller), &name, amount(&price)?)
                .await?;
            json!({ "channel_id": id })
        }
        Command::Join {
            account,
            channel_id,
            paid,
        } => {
            let id = ledger
                .join(ChannelId(channel_id), &AccountId::new(account), amount(&paid)?)
                .await?;
            json!({ "token_id": id })
        }
        Command::Withdraw { caller } => {
            let moved = ledger.withdraw(&AccountId::new(caller)).await?;
            json!({ "recipient": ledger.administrator(), "amount": show(moved) })
        }
        Command::SetProfile {
            account,
            name,
            bio,
            avatar_url,
        } => {
            let account = AccountId::new(account);
            ledger.set_profile(&account, &name, &bio, &avatar_url).await?;
            json!(ledger.get_profile(&account))
        }
        Command::Channel { id } => {
            let channel = ledger.get_channel(ChannelId(id))?;
            json!({ "id": channel.id, "name": channel.name, "price": show(channel.price) })
        }
        Command::Channels => Value::Array(
            ledger
                .channels()
                .into_iter()
                .map(|c| json!({ "id": c.id, "name": c.name, "price": show(c.price) }))
                .collect(),
        ),
        Command::HasJoined {
            channel_id,
            account,
        } => {
            json!({ "joined": ledger.has_joined(ChannelId(channel_id), &AccountId::new(account)) })
        }
        Command::Supply => json!({ "total_supply": ledger.total_supply() }),
        Command::Token { id } => json!(ledger.token(TokenId(id))?),
        Command::Profile { account } => json!(ledger.get_profile(&AccountId::new(account))),
        Command::Treasury => {
            let treasury = ledger.treasury();
            json!({
                "balance": show(treasury.balance),
                "collected": show(treasury.collected),
                "withdrawn": show(treasury.withdrawn),
            })
        }
        Command::Info => {
            let snapshot = ledger.snapshot();
            json!({
                "name": ledger.name(),
                "symbol": ledger.symbol(),
                "administrator": ledger.administrator(),
                "total_channels": snapshot.total_channels(),
                "total_supply": snapshot.total_supply(),
                "treasury_balance": show(snapshot.treasury().balance),
            })
        }
        Command::Serve { port } => {
            let Some(port) = port.or(config.ledger.metrics_port) else {
                anyhow::bail!("serve needs --port or ledger.metrics_port");
            };
            info!(
                name = %ledger.name(),
                symbol = %ledger.symbol(),
                port,
                "Serving ledger"
            );
            tokio::select! {
                _ = chanledger::http::run_http_server(port, ledger.clone(), decimals) => {}
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
            return Ok(());
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
