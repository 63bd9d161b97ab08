//! CLI command handlers.

pub mod call;
pub mod config;
pub mod indicator;
pub mod quote;
pub mod watchlist;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use kabu_config::LoadedConfig;
use kabu_mcp::{InvocationOutcome, ToolClient};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config directory, if given.
    pub config_dir: Option<PathBuf>,
    /// Configuration after file layers and env overrides.
    pub loaded: LoadedConfig,
    /// Decode JSON text payloads before printing.
    pub decode: bool,
    /// Print monitor statistics to stderr.
    pub stats: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Tool client for the resolved worker settings.
    pub fn client(&self) -> Result<ToolClient> {
        let config = self
            .loaded
            .config
            .worker_config()
            .context("invalid worker configuration")?;
        tracing::debug!(
            interpreter = %config.interpreter.display(),
            script = %config.script.display(),
            timeout_ms = config.timeout.as_millis() as u64,
            max_attempts = config.max_attempts,
            "worker configuration"
        );
        Ok(ToolClient::new(config))
    }

    /// Print an outcome as pretty JSON; a failed outcome becomes an error.
    pub fn emit(&self, client: &ToolClient, mut outcome: InvocationOutcome) -> Result<()> {
        if self.decode {
            outcome.data = outcome.decoded_data();
        }
        println!("{}", serde_json::to_string_pretty(&outcome)?);

        if self.stats {
            let stats = client.monitor().stats(None);
            eprintln!("{}", serde_json::to_string_pretty(&stats)?);
        }

        if outcome.success {
            return Ok(());
        }
        anyhow::bail!(
            "tool call failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        )
    }
}
