//! kabu - command-line client for the stock tool worker
//!
//! Main entry point for the kabu CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{call, config, indicator, quote, watchlist};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// kabu - query stock data through the MCP stock worker
#[derive(Parser)]
#[command(name = "kabu")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config directory (default: platform config dir)
    #[arg(long, global = true, env = "KABU_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Decode JSON text payloads before printing
    #[arg(long, global = true)]
    pub decode: bool,

    /// Print call statistics to stderr when done
    #[arg(long, global = true)]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Current price of a symbol
    Price(quote::SymbolArgs),

    /// Price history of a symbol
    History(quote::HistoryArgs),

    /// Compare two symbols
    Compare(quote::CompareArgs),

    /// Fundamental data of a symbol
    Fundamentals(quote::SymbolArgs),

    /// Analyze a symbol
    Analyze(quote::AnalyzeArgs),

    /// Watchlist management
    Watchlist(watchlist::WatchlistArgs),

    /// Technical indicators
    Indicator(indicator::IndicatorArgs),

    /// Call any worker tool with raw JSON arguments
    Call(call::CallArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loaded = kabu_config::load_config_with_options(None, cli.config_dir.as_deref());
    loaded.apply_env();

    let _guard = init_tracing(&cli, &loaded.config.logging_or_default());
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    let ctx = commands::Context {
        config_dir: cli.config_dir.clone(),
        loaded,
        decode: cli.decode,
        stats: cli.stats,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Price(args) => quote::price(args, &ctx).await,
        Commands::History(args) => quote::history(args, &ctx).await,
        Commands::Compare(args) => quote::compare(args, &ctx).await,
        Commands::Fundamentals(args) => quote::fundamentals(args, &ctx).await,
        Commands::Analyze(args) => quote::analyze(args, &ctx).await,
        Commands::Watchlist(args) => watchlist::run(args, &ctx).await,
        Commands::Indicator(args) => indicator::run(args, &ctx).await,
        Commands::Call(args) => call::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console (human-readable, stderr) plus an optional daily JSON log file.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(cli: &Cli, logging: &kabu_config::LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let console_filter = if cli.verbose {
        EnvFilter::new("kabu=debug,kabu_mcp=debug,kabu_config=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let (file_layer, guard) = if logging.file {
        let log_dir = logging
            .directory
            .clone()
            .or_else(|| cli.config_dir.as_ref().map(|d| d.join("logs")))
            .or_else(|| kabu_config::xdg_config_dir().map(|d| d.join("logs")))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "kabu.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let level = &logging.level;
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(EnvFilter::new(format!(
                "kabu={level},kabu_mcp={level},kabu_config={level},warn"
            )));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}
