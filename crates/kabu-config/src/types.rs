//! Configuration types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use kabu_mcp::WorkerConfig;
use kabu_mcp::protocol::ClientInfo;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Root configuration, as read from `config.toml` / `kabu.toml`.
///
/// Every section is optional so that a layer only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KabuConfig {
    /// How the worker process is launched.
    pub worker: Option<WorkerSection>,
    /// Retry behavior around each tool call.
    pub retry: Option<RetrySection>,
    /// Diagnostic logging.
    pub logging: Option<LoggingConfig>,
}

impl KabuConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: KabuConfig) {
        if other.worker.is_some() {
            self.worker = other.worker;
        }
        if other.retry.is_some() {
            self.retry = other.retry;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Config with every section filled with defaults, for `config init`.
    pub fn with_defaults() -> Self {
        Self {
            worker: Some(WorkerSection::default()),
            retry: Some(RetrySection::default()),
            logging: Some(LoggingConfig::default()),
        }
    }

    pub fn worker_or_default(&self) -> WorkerSection {
        self.worker.clone().unwrap_or_default()
    }

    pub fn retry_or_default(&self) -> RetrySection {
        self.retry.clone().unwrap_or_default()
    }

    pub fn logging_or_default(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check values that would make every call fail.
    pub fn validate(&self) -> Result<()> {
        let worker = self.worker_or_default();
        if worker.interpreter.as_os_str().is_empty() {
            return Err(ConfigError::invalid("worker.interpreter", "must not be empty"));
        }
        if worker.script.as_os_str().is_empty() {
            return Err(ConfigError::invalid("worker.script", "must not be empty"));
        }
        if worker.timeout_ms == 0 {
            return Err(ConfigError::invalid("worker.timeout_ms", "must be greater than zero"));
        }
        let retry = self.retry_or_default();
        if retry.backoff_base_ms > retry.backoff_max_ms {
            return Err(ConfigError::invalid(
                "retry.backoff_base_ms",
                format!(
                    "{} exceeds backoff_max_ms ({})",
                    retry.backoff_base_ms, retry.backoff_max_ms
                ),
            ));
        }
        Ok(())
    }

    /// Build the launch configuration handed to the tool client.
    pub fn worker_config(&self) -> Result<WorkerConfig> {
        self.validate()?;
        let worker = self.worker_or_default();
        let retry = self.retry_or_default();

        let mut config = WorkerConfig::new(worker.interpreter, worker.script)
            .with_timeout(Duration::from_millis(worker.timeout_ms))
            .with_max_attempts(retry.max_attempts)
            .with_backoff(
                Duration::from_millis(retry.backoff_base_ms),
                Duration::from_millis(retry.backoff_max_ms),
            )
            .with_search_path_var(worker.search_path_var)
            .with_client_info(ClientInfo::new(worker.client_name, env!("CARGO_PKG_VERSION")));
        for (key, value) in worker.env {
            config = config.with_env_var(key, value);
        }
        Ok(config)
    }
}

/// `[worker]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// Interpreter executable.
    pub interpreter: PathBuf,
    /// Worker script, resolved against the current directory.
    pub script: PathBuf,
    /// Per-attempt deadline in milliseconds.
    pub timeout_ms: u64,
    /// Variable pointed at the script's directory.
    pub search_path_var: String,
    /// Name announced during the handshake.
    pub client_name: String,
    /// Extra environment for the worker.
    pub env: BTreeMap<String, String>,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python3"),
            script: PathBuf::from("standard_mcp_server.py"),
            timeout_ms: kabu_mcp::config::DEFAULT_TIMEOUT.as_millis() as u64,
            search_path_var: kabu_mcp::config::DEFAULT_SEARCH_PATH_VAR.to_string(),
            client_name: "kabu".to_string(),
            env: BTreeMap::new(),
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Attempts per invocation, including the first. 0 behaves like 1.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: kabu_mcp::config::DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: kabu_mcp::config::DEFAULT_BACKOFF_BASE.as_millis() as u64,
            backoff_max_ms: kabu_mcp::config::DEFAULT_BACKOFF_MAX.as_millis() as u64,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter level for the log file.
    pub level: String,
    /// Write a daily-rolling JSON log file.
    pub file: bool,
    /// Directory for log files. Defaults to `<config dir>/logs`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
            directory: None,
        }
    }
}
