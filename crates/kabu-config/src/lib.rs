//! Configuration system for the kabu stock tool client.
//!
//! Provides TOML-based configuration with:
//! - Worker launch settings (`[worker]`): interpreter, script, timeout
//! - Retry settings (`[retry]`)
//! - Logging settings (`[logging]`)
//! - Config file layering (user config + project-local `kabu.toml`)
//! - `MCP_*` environment overrides applied on top

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigSource, LoadedConfig, config_path_in, load_config, load_config_file,
    load_config_with_options, save_config, xdg_config_dir, xdg_config_path,
};
pub use env::{apply_env_overrides, apply_overrides_from};
pub use error::{ConfigError, Result};
pub use types::*;
