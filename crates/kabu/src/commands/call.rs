//! Raw tool call.

use anyhow::{Context as _, Result};
use clap::Args;
use serde_json::Value;

use super::Context;

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Worker tool name (e.g. get_stock_price)
    pub tool: String,

    /// Arguments as a JSON object
    #[arg(long, default_value = "{}")]
    pub args: String,
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let arguments: Value = serde_json::from_str(&args.args)
        .with_context(|| format!("--args is not valid JSON: {}", args.args))?;
    if !arguments.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }

    let client = ctx.client()?;
    let outcome = client.call_tool(&args.tool, arguments).await;
    ctx.emit(&client, outcome)
}
