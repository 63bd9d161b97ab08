//! Environment-variable overrides, applied after all file layers.

use std::path::PathBuf;

use crate::KabuConfig;

/// Interpreter executable.
pub const ENV_PYTHON_PATH: &str = "MCP_PYTHON_PATH";
/// Worker script path.
pub const ENV_SERVER_PATH: &str = "MCP_SERVER_PATH";
/// Per-attempt timeout in milliseconds.
pub const ENV_TIMEOUT: &str = "MCP_TIMEOUT";
/// Attempts per invocation.
pub const ENV_RETRY_COUNT: &str = "MCP_RETRY_COUNT";

/// Apply overrides from the process environment.
///
/// Returns a warning for every variable that was set but unusable.
pub fn apply_env_overrides(config: &mut KabuConfig) -> Vec<String> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides using `lookup` as the environment.
pub fn apply_overrides_from<F>(config: &mut KabuConfig, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = get(ENV_PYTHON_PATH) {
        config.worker.get_or_insert_with(Default::default).interpreter = PathBuf::from(path);
    }
    if let Some(path) = get(ENV_SERVER_PATH) {
        config.worker.get_or_insert_with(Default::default).script = PathBuf::from(path);
    }
    if let Some(raw) = get(ENV_TIMEOUT) {
        match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => {
                config.worker.get_or_insert_with(Default::default).timeout_ms = ms;
            }
            _ => warnings.push(format!(
                "ignoring {ENV_TIMEOUT}={raw}: expected a positive number of milliseconds"
            )),
        }
    }
    if let Some(raw) = get(ENV_RETRY_COUNT) {
        match raw.trim().parse::<u32>() {
            Ok(n) => config.retry.get_or_insert_with(Default::default).max_attempts = n,
            Err(_) => warnings.push(format!(
                "ignoring {ENV_RETRY_COUNT}={raw}: expected a whole number"
            )),
        }
    }

    warnings
}
