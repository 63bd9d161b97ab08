//! Quote commands: price, history, compare, fundamentals, analyze.

use anyhow::Result;
use clap::Args;

use super::Context;

/// A single symbol.
#[derive(Args, Debug)]
pub struct SymbolArgs {
    /// Ticker symbol (e.g. AAPL, 7203.T)
    pub symbol: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Ticker symbol
    pub symbol: String,

    /// History period (1d, 5d, 1mo, 3mo, 6mo, 1y, 5y, max)
    #[arg(long, default_value = kabu_mcp::tools::DEFAULT_HISTORY_PERIOD)]
    pub period: String,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First ticker symbol
    pub symbol1: String,

    /// Second ticker symbol
    pub symbol2: String,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Ticker symbol
    pub symbol: String,

    /// Fetch price and history concurrently instead of calling the analyzer tool
    #[arg(long)]
    pub comprehensive: bool,
}

pub async fn price(args: SymbolArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let outcome = client.get_stock_price(&args.symbol).await;
    ctx.emit(&client, outcome)
}

pub async fn history(args: HistoryArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let outcome = client.get_stock_history(&args.symbol, Some(&args.period)).await;
    ctx.emit(&client, outcome)
}

pub async fn compare(args: CompareArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let outcome = client.compare_stocks(&args.symbol1, &args.symbol2).await;
    ctx.emit(&client, outcome)
}

pub async fn fundamentals(args: SymbolArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let outcome = client.get_fundamentals(&args.symbol).await;
    ctx.emit(&client, outcome)
}

pub async fn analyze(args: AnalyzeArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let outcome = if args.comprehensive {
        client.get_comprehensive_analysis(&args.symbol).await
    } else {
        client.analyze_stock(&args.symbol).await
    };
    ctx.emit(&client, outcome)
}
