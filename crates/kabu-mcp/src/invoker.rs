//! The seam between the client facade and the process machinery.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::WorkerConfig;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::session::ProcessSession;

/// Runs one attempt of a tool call.
///
/// [`ToolClient`](crate::ToolClient) wraps every call to the invoker in its
/// retry policy, so an implementation should not retry on its own.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invoke `tool` once with `arguments`.
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<Value>;

    /// Retry policy the client should apply around this invoker.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

/// Shared invoker handle.
pub type SharedInvoker = Arc<dyn ToolInvoker>;

/// Spawns a fresh worker process for every attempt.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    config: Arc<WorkerConfig>,
}

impl ProcessInvoker {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

#[async_trait]
impl ToolInvoker for ProcessInvoker {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<Value> {
        ProcessSession::new(self.config.clone(), tool, arguments)
            .invoke()
            .await
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }
}
