//! The `{success, data, error}` value handed back to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Final result of one invocation, after any retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    /// Whether an attempt succeeded.
    pub success: bool,
    /// Tool payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Message of the last failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationOutcome {
    /// Successful outcome carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed outcome carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Whether the invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The payload with one layer of string encoding removed.
    ///
    /// Workers usually return JSON documents as the text of the first content
    /// item. When `data` is a string holding JSON, the parsed document is
    /// returned; any other `data` comes back unchanged.
    pub fn decoded_data(&self) -> Option<Value> {
        match self.data.as_ref()? {
            Value::String(text) => {
                Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())))
            }
            other => Some(other.clone()),
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<Value, String> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(self.error.unwrap_or_else(|| "unknown error".to_string()))
        }
    }
}
