//! Error types for worker invocations.

use std::time::Duration;

use thiserror::Error;

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Error type for a single worker invocation attempt.
///
/// None of these escape [`ToolClient`](crate::ToolClient): the retry loop
/// folds the last one into [`InvocationOutcome::error`](crate::InvocationOutcome).
#[derive(Debug, Error)]
pub enum McpError {
    /// The interpreter or script could not be launched.
    #[error("failed to spawn worker '{program}': {reason}")]
    Spawn {
        /// Program that was being launched.
        program: String,
        /// Why the launch failed.
        reason: String,
    },

    /// The `initialize` handshake did not complete.
    #[error("worker initialization failed: {0}")]
    Initialization(String),

    /// The worker answered the tool call with a JSON-RPC error object.
    #[error("tool error {code}: {message}")]
    ToolCall {
        /// Error code from the worker.
        code: i64,
        /// Error message from the worker.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// No resolution arrived before the configured deadline.
    #[error("worker timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The worker exited after the handshake but before answering.
    #[error("worker exited before responding (status: {}): {stderr}", status.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ProcessExit {
        /// Exit code, when the process exited normally.
        status: Option<i32>,
        /// Captured standard error output.
        stderr: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Create a spawn error.
    pub fn spawn(program: impl Into<String>, reason: impl ToString) -> Self {
        Self::Spawn {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an initialization error.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create a tool-call error from a JSON-RPC error object.
    pub fn tool_call(code: i64, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::ToolCall {
            code,
            message: message.into(),
            data,
        }
    }

    /// Short machine-friendly name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Initialization(_) => "initialization",
            Self::ToolCall { .. } => "tool_call",
            Self::Timeout(_) => "timeout",
            Self::ProcessExit { .. } => "process_exit",
            Self::Json(_) => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = McpError::spawn("python3", "No such file or directory");
        assert!(err.to_string().contains("spawn"));
        assert!(err.to_string().contains("python3"));

        let err = McpError::tool_call(-32602, "Missing required parameter: symbol", None);
        assert!(err.to_string().contains("-32602"));
        assert!(err.to_string().contains("Missing required parameter"));

        let err = McpError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "worker timed out after 1500ms");
    }

    #[test]
    fn test_process_exit_display() {
        let err = McpError::ProcessExit {
            status: Some(1),
            stderr: "Traceback (most recent call last)".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("status: 1"));
        assert!(msg.contains("Traceback"));

        let err = McpError::ProcessExit {
            status: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("status: unknown"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: McpError = json_err.into();
        assert!(matches!(err, McpError::Json(_)));
        assert_eq!(err.kind(), "json");
    }
}
