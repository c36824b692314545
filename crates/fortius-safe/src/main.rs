//! fortius-safe: inspect and decode the pending queue of a Safe account

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::History {
            safe,
            service,
            trailing_drop,
            delegates,
        } => commands::history(safe, &service, trailing_drop, delegates).await,
        Commands::DecodeSchedule { calldata } => commands::decode_schedule_calldata(&calldata),
        Commands::Decode {
            safe,
            to,
            value,
            calldata,
            service,
        } => commands::decode(safe, to, &value, &calldata, &service).await,
        Commands::Balances { safe, service } => commands::balances(safe, &service).await,
    }
}
