//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use kabu_config::KabuConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration as TOML
    Show,

    /// Show configuration file path
    Path,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./kabu.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(ctx),
        ConfigCommand::Init { local, force } => cmd_init(ctx, local, force),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("# No config files loaded (using defaults)");
    } else {
        for source in &sources {
            println!("# loaded: {}", source.display());
        }
    }
    for warning in &loaded.warnings {
        println!("# warning: {warning}");
    }
    println!();

    let effective = KabuConfig {
        worker: Some(loaded.config.worker_or_default()),
        retry: Some(loaded.config.retry_or_default()),
        logging: Some(loaded.config.logging_or_default()),
    };
    print!("{}", effective.to_toml()?);
    Ok(())
}

fn user_config_path(ctx: &Context) -> Result<PathBuf> {
    kabu_config::config_path_in(ctx.config_dir.as_deref())
        .context("could not determine config directory; set KABU_CONFIG_DIR")
}

fn cmd_path(ctx: &Context) -> Result<()> {
    let path = user_config_path(ctx)?;
    println!("{}", path.display());
    if ctx.verbose && !path.is_file() {
        eprintln!("(file does not exist yet, run `kabu config init`)");
    }
    Ok(())
}

fn cmd_init(ctx: &Context, local: bool, force: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("kabu.toml")
    } else {
        user_config_path(ctx)?
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    kabu_config::save_config(&KabuConfig::with_defaults(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
