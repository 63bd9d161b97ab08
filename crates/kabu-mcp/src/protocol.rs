//! JSON-RPC 2.0 protocol types spoken with the worker.
//!
//! Every message is one JSON object on its own line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version announced during `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Method name of the handshake request.
pub const METHOD_INITIALIZE: &str = "initialize";

/// Method name of the handshake completion notification.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";

/// Method name of a tool invocation.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

// ─────────────────────────────────────────────────────────────────────────────
// JSON-RPC Base Types
// ─────────────────────────────────────────────────────────────────────────────

/// A JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request ID for correlating responses.
    pub id: u64,
    /// Method name to call.
    pub method: String,
    /// Method parameters (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request.
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// Build a `tools/call` request.
    pub fn tool_call(id: u64, name: impl Into<String>, arguments: Value) -> Self {
        let name: String = name.into();
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        Self::new(id, METHOD_TOOLS_CALL, Some(params))
    }
}

/// A JSON-RPC notification (no id, no response expected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Method parameters (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }

    /// The handshake completion notification.
    pub fn initialized() -> Self {
        Self::new(METHOD_INITIALIZED, None)
    }
}

/// A JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version. Some workers omit it, so it is not required.
    #[serde(default)]
    pub jsonrpc: String,
    /// Request ID this response is for.
    pub id: u64,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Interpret a parsed frame as a response.
    ///
    /// Returns `None` for frames that are not responses: server notifications,
    /// requests, or JSON without a numeric `id`.
    pub fn from_frame(frame: Value) -> Option<Self> {
        if frame.get("method").is_some() {
            return None;
        }
        serde_json::from_value(frame).ok()
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Optional additional data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A message written to the worker's stdin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    /// A request expecting a response.
    Request(JsonRpcRequest),
    /// A fire-and-forget notification.
    Notification(JsonRpcNotification),
}

impl Outbound {
    /// Method name of the message.
    pub fn method(&self) -> &str {
        match self {
            Self::Request(req) => &req.method,
            Self::Notification(n) => &n.method,
        }
    }

    /// Serialize as a single newline-terminated line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MCP Handshake Types
// ─────────────────────────────────────────────────────────────────────────────

/// Tools capability announced by the client. Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsCapability {}

/// Client capabilities sent during initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Tools capability.
    pub tools: ToolsCapability,
}

/// Client info sent during initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

impl ClientInfo {
    /// Create client info with an explicit name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new("kabu", env!("CARGO_PKG_VERSION"))
    }
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version.
    pub protocol_version: String,
    /// Client capabilities.
    pub capabilities: ClientCapabilities,
    /// Client info.
    pub client_info: ClientInfo,
}

impl InitializeParams {
    /// Create initialize params for the given client.
    pub fn new(client_info: ClientInfo) -> Self {
        Self {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info,
        }
    }
}

/// Server info returned during initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    #[serde(default)]
    pub version: String,
}

/// Result of the initialize request. Workers vary, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Server info.
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
}

/// Extract the caller-facing payload from a tool-call `result`.
///
/// Yields `result.content[0].text` when present, else the whole `result`.
/// The text is returned as-is even when it holds encoded JSON.
pub fn tool_payload(result: Value) -> Value {
    match result
        .get("content")
        .and_then(|c| c.get(0))
        .and_then(|first| first.get("text"))
    {
        Some(text) => text.clone(),
        None => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_request_wire_format() {
        let params = InitializeParams::new(ClientInfo::new("kabu", "1.2.3"));
        let req = JsonRpcRequest::new(1, METHOD_INITIALIZE, Some(serde_json::to_value(params).unwrap()));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {}},
                    "clientInfo": {"name": "kabu", "version": "1.2.3"}
                }
            })
        );
    }

    #[test]
    fn test_initialized_notification_has_no_id_or_params() {
        let line = Outbound::Notification(JsonRpcNotification::initialized())
            .to_line()
            .unwrap();
        assert_eq!(
            line,
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n"
        );
    }

    #[test]
    fn test_tool_call_request() {
        let req = JsonRpcRequest::tool_call(7, "get_stock_price", json!({"symbol": "7203.T"}));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["method"], "tools/call");
        assert_eq!(value["id"], 7);
        assert_eq!(value["params"]["name"], "get_stock_price");
        assert_eq!(value["params"]["arguments"]["symbol"], "7203.T");
    }

    #[test]
    fn test_response_from_frame() {
        let resp = JsonRpcResponse::from_frame(json!({"jsonrpc":"2.0","id":3,"result":{"value":42}}))
            .unwrap();
        assert_eq!(resp.id, 3);
        assert!(resp.error.is_none());

        let resp = JsonRpcResponse::from_frame(
            json!({"jsonrpc":"2.0","id":3,"error":{"code":-32600,"message":"Invalid Request"}}),
        )
        .unwrap();
        assert_eq!(resp.error.unwrap().code, -32600);
    }

    #[test]
    fn test_non_response_frames_are_rejected() {
        assert!(JsonRpcResponse::from_frame(json!({"jsonrpc":"2.0","method":"notifications/message"})).is_none());
        assert!(JsonRpcResponse::from_frame(json!({"jsonrpc":"2.0","id":5,"method":"ping"})).is_none());
        assert!(JsonRpcResponse::from_frame(json!({"id":"abc","result":{}})).is_none());
        assert!(JsonRpcResponse::from_frame(json!([1, 2, 3])).is_none());
        assert!(JsonRpcResponse::from_frame(json!("log line")).is_none());
    }

    #[test]
    fn test_tool_payload_prefers_first_text() {
        let result = json!({"content": [{"type": "text", "text": "2500.5"}, {"text": "ignored"}]});
        assert_eq!(tool_payload(result), json!("2500.5"));
    }

    #[test]
    fn test_tool_payload_falls_back_to_result() {
        let result = json!({"price": 2500.5});
        assert_eq!(tool_payload(result.clone()), result);

        let result = json!({"content": []});
        assert_eq!(tool_payload(result.clone()), result);
    }

    #[test]
    fn test_initialize_result_tolerates_missing_fields() {
        let parsed: InitializeResult = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.server_info.is_none());

        let parsed: InitializeResult = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "stock-server", "version": "1.0.0"}
        }))
        .unwrap();
        assert_eq!(parsed.server_info.unwrap().name, "stock-server");
    }
}
