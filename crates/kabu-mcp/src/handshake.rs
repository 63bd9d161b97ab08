//! The `initialize` handshake that precedes every tool call.
//!
//! ```text
//! NotStarted ──begin()──▶ InitSent ──id=1 result──▶ Initialized
//!                            │
//!                            └──id=1 error / fail()──▶ Failed
//! ```
//!
//! The tool-call request is handed to the coordinator up front and only
//! released on the transition into `Initialized`, so it cannot be written
//! before the worker has acknowledged `initialize`.

use crate::error::{McpError, Result};
use crate::protocol::{
    ClientInfo, InitializeParams, InitializeResult, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, METHOD_INITIALIZE, Outbound,
};

/// Request id reserved for the `initialize` request.
pub const HANDSHAKE_ID: u64 = 1;

/// Progress of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing written yet.
    NotStarted,
    /// `initialize` written, waiting for its response.
    InitSent,
    /// Worker acknowledged; tool call released.
    Initialized,
    /// Handshake rejected or abandoned.
    Failed,
}

/// Drives the handshake for one session.
#[derive(Debug)]
pub struct HandshakeCoordinator {
    state: HandshakeState,
    client_info: ClientInfo,
    tool_call: Option<JsonRpcRequest>,
}

impl HandshakeCoordinator {
    /// Create a coordinator that will release `tool_call` once initialized.
    pub fn new(client_info: ClientInfo, tool_call: JsonRpcRequest) -> Self {
        debug_assert_ne!(tool_call.id, HANDSHAKE_ID, "tool call must not reuse the handshake id");
        Self {
            state: HandshakeState::NotStarted,
            client_info,
            tool_call: Some(tool_call),
        }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the handshake completed.
    pub fn is_initialized(&self) -> bool {
        self.state == HandshakeState::Initialized
    }

    /// Produce the `initialize` request and move to `InitSent`.
    pub fn begin(&mut self) -> Result<Outbound> {
        if self.state != HandshakeState::NotStarted {
            return Err(McpError::initialization(format!(
                "handshake already started (state: {:?})",
                self.state
            )));
        }
        let params = serde_json::to_value(InitializeParams::new(self.client_info.clone()))?;
        self.state = HandshakeState::InitSent;
        Ok(Outbound::Request(JsonRpcRequest::new(
            HANDSHAKE_ID,
            METHOD_INITIALIZE,
            Some(params),
        )))
    }

    /// Advance on the response to `initialize`.
    ///
    /// On success returns the messages to write, in order: the
    /// `notifications/initialized` notification, then the tool call.
    pub fn on_response(&mut self, response: JsonRpcResponse) -> Result<Vec<Outbound>> {
        if response.id != HANDSHAKE_ID {
            return Err(McpError::initialization(format!(
                "unexpected response id {} during handshake",
                response.id
            )));
        }
        if self.state != HandshakeState::InitSent {
            tracing::debug!(state = ?self.state, "ignoring duplicate initialize response");
            return Ok(Vec::new());
        }

        if let Some(err) = response.error {
            return Err(self.fail(format!(
                "worker rejected initialize ({}): {}",
                err.code, err.message
            )));
        }
        let Some(result) = response.result else {
            return Err(self.fail("initialize response carried neither result nor error"));
        };

        match serde_json::from_value::<InitializeResult>(result) {
            Ok(InitializeResult {
                server_info: Some(info),
                protocol_version,
            }) => tracing::debug!(
                server = %info.name,
                version = %info.version,
                protocol = protocol_version.as_deref().unwrap_or("unknown"),
                "worker initialized"
            ),
            Ok(_) => tracing::debug!("worker initialized without server info"),
            Err(e) => tracing::debug!(error = %e, "worker initialized with unrecognized result"),
        }

        let Some(tool_call) = self.tool_call.take() else {
            return Err(self.fail("tool call already released"));
        };
        self.state = HandshakeState::Initialized;

        Ok(vec![
            Outbound::Notification(JsonRpcNotification::initialized()),
            Outbound::Request(tool_call),
        ])
    }

    /// Mark the handshake as failed and build the matching error.
    pub fn fail(&mut self, reason: impl Into<String>) -> McpError {
        self.state = HandshakeState::Failed;
        McpError::initialization(reason)
    }
}
