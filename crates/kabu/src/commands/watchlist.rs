//! Watchlist commands.
//!
//! The watchlist itself lives in the worker; these commands only forward.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

#[derive(Args, Debug)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    pub command: WatchlistCommand,
}

#[derive(Subcommand, Debug)]
pub enum WatchlistCommand {
    /// Add a symbol to the watchlist
    Add {
        /// Ticker symbol
        symbol: String,
    },

    /// Remove a symbol from the watchlist
    Remove {
        /// Ticker symbol
        symbol: String,
    },

    /// List watched symbols
    List,

    /// Prices for every watched symbol
    Prices {
        /// Use the realtime price source
        #[arg(long)]
        realtime: bool,
    },
}

/// Run the watchlist command.
pub async fn run(args: WatchlistArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let outcome = match args.command {
        WatchlistCommand::Add { symbol } => client.add_to_watchlist(&symbol).await,
        WatchlistCommand::Remove { symbol } => client.remove_from_watchlist(&symbol).await,
        WatchlistCommand::List => client.get_watchlist().await,
        WatchlistCommand::Prices { realtime: true } => client.get_realtime_watchlist_prices().await,
        WatchlistCommand::Prices { realtime: false } => client.get_watchlist_prices().await,
    };
    ctx.emit(&client, outcome)
}
