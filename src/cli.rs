use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chanledger", about = "Token-gated community channel ledger", version)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, default_value = "chanledger.toml")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a channel (administrator only).
    CreateChannel {
        #[arg(long)]
        caller: String,
        name: String,
        /// Admission price, in whole units with optional decimals (e.g. "0.5").
        price: String,
    },
    /// Pay to join a channel.
    Join {
        #[arg(long)]
        account: String,
        channel_id: u64,
        paid: String,
    },
    /// Move the whole treasury to the administrator.
    Withdraw {
        #[arg(long)]
        caller: String,
    },
    SetProfile {
        #[arg(long)]
        account: String,
        name: String,
        #[arg(long, default_value = "")]
        bio: String,
        #[arg(long = "avatar-url", default_value = "")]
        avatar_url: String,
    },
    Channel {
        id: u64,
    },
    Channels,
    HasJoined {
        channel_id: u64,
        account: String,
    },
    /// Number of membership tokens minted.
    Supply,
    Token {
        id: u64,
    },
    Profile {
        account: String,
    },
    Treasury,
    /// Collection identity and totals.
    Info,
    /// Keep the ledger open and serve /metrics and read-only views over HTTP.
    Serve {
        /// Overrides `ledger.metrics_port`.
        #[arg(long)]
        port: Option<u16>,
    },
}
