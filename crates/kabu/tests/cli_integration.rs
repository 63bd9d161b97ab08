//! CLI integration tests for the kabu command-line interface.
//!
//! These tests verify:
//! - Help text and argument parsing
//! - Config commands against a temporary config directory
//! - Failed tool calls print a failure outcome and exit non-zero
//!
//! No worker is started successfully here; the worker round trip is covered by
//! the kabu-mcp integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the kabu binary, isolated from the user's config and env.
fn kabu(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kabu").unwrap();
    cmd.env("KABU_CONFIG_DIR", config_dir.path())
        .env_remove("MCP_PYTHON_PATH")
        .env_remove("MCP_SERVER_PATH")
        .env_remove("MCP_TIMEOUT")
        .env_remove("MCP_RETRY_COUNT")
        .env_remove("RUST_LOG")
        .current_dir(config_dir.path());
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("price"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("watchlist"))
        .stdout(predicate::str::contains("indicator"))
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kabu"));
}

#[test]
fn test_price_requires_symbol() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .arg("price")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SYMBOL"));
}

#[test]
fn test_indicator_help_lists_indicators() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .args(["indicator", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rsi"))
        .stdout(predicate::str::contains("macd"))
        .stdout(predicate::str::contains("bollinger"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    kabu(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join("config.toml").is_file());

    // A second init refuses to overwrite.
    kabu(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    kabu(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# loaded:"))
        .stdout(predicate::str::contains("timeout_ms = 30000"));
}

#[test]
fn test_config_show_reflects_env_overrides() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .env("MCP_TIMEOUT", "1234")
        .env("MCP_RETRY_COUNT", "abc")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_ms = 1234"))
        .stdout(predicate::str::contains("max_attempts = 3"))
        .stdout(predicate::str::contains("# warning: ignoring MCP_RETRY_COUNT"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Call Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_failed_call_prints_outcome_and_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .env("MCP_PYTHON_PATH", "/nonexistent/kabu/python")
        .env("MCP_RETRY_COUNT", "1")
        .args(["price", "7203.T"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("failed to spawn worker"));
}

#[test]
fn test_call_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .args(["call", "get_stock_price", "--args", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn test_stats_flag_prints_monitor_stats() {
    let dir = TempDir::new().unwrap();
    kabu(&dir)
        .env("MCP_PYTHON_PATH", "/nonexistent/kabu/python")
        .env("MCP_RETRY_COUNT", "1")
        .args(["--stats", "watchlist", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"totalCalls\": 1"));
}
