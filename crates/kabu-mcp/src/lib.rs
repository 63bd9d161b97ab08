//! Stdio JSON-RPC client for the kabu stock tool worker.
//!
//! Every tool call launches a fresh worker process, performs the MCP
//! `initialize` handshake, sends one `tools/call` request, waits for the
//! correlated response and tears the process down again. Calls are wrapped in
//! a bounded retry loop and always end in an [`InvocationOutcome`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolClient                                                 │
//! │  - One typed method per tool, plus call_tool                │
//! │  - Records every invocation in the CallMonitor              │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  RetryPolicy                                                │
//! │  - Up to max_attempts, backoff min(base * 2^(n-1), cap)     │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolInvoker (ProcessInvoker)                               │
//! │  - ProcessSession: spawn, handshake, call, kill, reap       │
//! │  - FrameParser: newline-delimited JSON from stdout          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use kabu_mcp::{ToolClient, WorkerConfig};
//!
//! let config = WorkerConfig::new("python3", "standard_mcp_server.py");
//! let client = ToolClient::new(config);
//!
//! let outcome = client.get_stock_price("7203.T").await;
//! if outcome.success {
//!     println!("{:?}", outcome.decoded_data());
//! }
//! ```
//!
//! # Wire protocol
//!
//! ```text
//! → {"jsonrpc":"2.0","id":1,"method":"initialize","params":{...}}
//! ← {"jsonrpc":"2.0","id":1,"result":{...}}
//! → {"jsonrpc":"2.0","method":"notifications/initialized"}
//! → {"jsonrpc":"2.0","id":N,"method":"tools/call","params":{"name":..,"arguments":{..}}}
//! ← {"jsonrpc":"2.0","id":N,"result":{"content":[{"type":"text","text":..}]}}
//! ```
//!
//! One JSON document per line. Lines that are not valid JSON are ignored.

pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod invoker;
pub mod monitor;
pub mod outcome;
pub mod protocol;
pub mod retry;
pub mod session;
pub mod tools;

// Re-export main types
pub use client::ToolClient;
pub use config::WorkerConfig;
pub use error::{McpError, Result};
pub use frame::FrameParser;
pub use handshake::{HandshakeCoordinator, HandshakeState};
pub use invoker::{ProcessInvoker, SharedInvoker, ToolInvoker};
pub use monitor::{CallMetrics, CallMonitor, MonitorStats, RecentError, ToolStats};
pub use outcome::InvocationOutcome;
pub use protocol::{
    ClientInfo, InitializeParams, InitializeResult, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse,
};
pub use retry::RetryPolicy;
pub use session::{PendingCall, ProcessSession};
pub use tools::{
    BollingerParams, MacdParams, MovingAverageParams, RsiParams, SupportResistanceParams,
    TrendParams, VolatilityParams,
};
