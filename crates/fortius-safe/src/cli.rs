use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "fortius-safe")]
#[command(about = "Inspect and decode the pending queue of a Safe account")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that talks to the Safe Transaction Service.
#[derive(Debug, Args)]
pub struct ServiceArgs {
    /// Safe Transaction Service base URL
    #[arg(long, env = "FORTIUS_SAFE_SERVICE_URL")]
    pub service_url: Option<String>,
    /// Request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the decoded pending queue of a Safe as JSON
    History {
        /// Safe address
        #[arg(long)]
        safe: Address,
        #[command(flatten)]
        service: ServiceArgs,
        /// Number of records dropped from the end of the listing
        #[arg(long)]
        trailing_drop: Option<usize>,
        /// Destinations decoded by the service instead of locally (repeatable)
        #[arg(long = "delegate")]
        delegates: Vec<Address>,
    },
    /// Decode timelock `schedule` calldata offline
    #[command(name = "decode-schedule")]
    DecodeSchedule {
        /// Calldata hex, with or without 0x prefix
        calldata: String,
    },
    /// Decode calldata the way the history view would
    Decode {
        /// Safe the call belongs to
        #[arg(long)]
        safe: Address,
        /// Call destination
        #[arg(long)]
        to: Address,
        /// Value sent with the call, in wei
        #[arg(long, default_value = "0")]
        value: String,
        /// Calldata hex, with or without 0x prefix; empty or `0x` is a plain transfer
        calldata: String,
        #[command(flatten)]
        service: ServiceArgs,
    },
    /// Print the token balances the service reports for a Safe
    Balances {
        /// Safe address
        #[arg(long)]
        safe: Address,
        #[command(flatten)]
        service: ServiceArgs,
    },
}
