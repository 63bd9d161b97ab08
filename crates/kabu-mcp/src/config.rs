//! Launch configuration for worker processes.

use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::ClientInfo;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default number of attempts per invocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);

/// Default upper bound on the backoff delay.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_millis(5000);

/// Environment variable pointed at the script's directory.
pub const DEFAULT_SEARCH_PATH_VAR: &str = "PYTHONPATH";

/// How to launch the worker and how hard to try.
///
/// Fixed at [`ToolClient`](crate::ToolClient) construction and shared
/// read-only by every session.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Interpreter executable (e.g. `python3` or a venv's `bin/python`).
    pub interpreter: PathBuf,
    /// Worker script passed as the interpreter's first argument.
    pub script: PathBuf,
    /// Deadline for one attempt, armed at spawn.
    pub timeout: Duration,
    /// Attempts per invocation, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles afterwards.
    pub backoff_base: Duration,
    /// Upper bound on any single backoff delay.
    pub backoff_max: Duration,
    /// Variable set to the script's directory in the worker's environment.
    pub search_path_var: String,
    /// Extra environment variables for the worker.
    pub env: Vec<(String, String)>,
    /// Identity announced in `initialize`.
    pub client_info: ClientInfo,
}

impl WorkerConfig {
    /// Create a config with default timeout and retry settings.
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
            search_path_var: DEFAULT_SEARCH_PATH_VAR.to_string(),
            env: Vec::new(),
            client_info: ClientInfo::default(),
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff base delay and cap.
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_max = max;
        self
    }

    /// Set the search-path variable name.
    pub fn with_search_path_var(mut self, var: impl Into<String>) -> Self {
        self.search_path_var = var.into();
        self
    }

    /// Add an environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the client identity sent during the handshake.
    pub fn with_client_info(mut self, info: ClientInfo) -> Self {
        self.client_info = info;
        self
    }
}
