//! One worker process, one tool call.
//!
//! A [`ProcessSession`] spawns the worker, runs the handshake, sends the tool
//! call, waits for the correlated response and kills the process. `invoke`
//! consumes the session, so a session can never be reused.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::WorkerConfig;
use crate::error::{McpError, Result};
use crate::frame::FrameParser;
use crate::handshake::{HANDSHAKE_ID, HandshakeCoordinator};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, Outbound, tool_payload};

/// Size of each stdout read.
const READ_CHUNK: usize = 8 * 1024;

/// Frames buffered between the reader task and the session.
const FRAME_QUEUE: usize = 64;

/// How long to wait for stderr to drain after the worker is killed.
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// Tail of stderr kept for diagnostics.
const MAX_STDERR_BYTES: usize = 16 * 1024;

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(HANDSHAKE_ID + 1);

/// Allocate a tool-call request id. Monotonic and never the handshake id.
pub fn next_call_id() -> u64 {
    NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed)
}

/// The single outstanding tool call of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    /// Request id the response must carry.
    pub id: u64,
    /// Tool being called.
    pub tool: String,
}

impl PendingCall {
    /// Turn the correlated response into the call's result.
    fn resolve(&self, response: JsonRpcResponse) -> Result<Value> {
        if let Some(err) = response.error {
            return Err(McpError::tool_call(err.code, err.message, err.data));
        }
        Ok(tool_payload(response.result.unwrap_or(Value::Null)))
    }
}

/// Owns the worker process for one invocation attempt.
pub struct ProcessSession {
    config: Arc<WorkerConfig>,
    pending: PendingCall,
    handshake: HandshakeCoordinator,
}

impl ProcessSession {
    /// Prepare a session; nothing is spawned until [`invoke`](Self::invoke).
    pub fn new(config: Arc<WorkerConfig>, tool: impl Into<String>, arguments: Value) -> Self {
        let tool = tool.into();
        let id = next_call_id();
        let request = JsonRpcRequest::tool_call(id, tool.clone(), arguments);
        let handshake = HandshakeCoordinator::new(config.client_info.clone(), request);

        Self {
            config,
            pending: PendingCall { id, tool },
            handshake,
        }
    }

    /// The outstanding call.
    pub fn pending(&self) -> &PendingCall {
        &self.pending
    }

    /// Run the attempt to completion, timeout, or worker exit.
    ///
    /// Once the process is spawned it is killed and reaped exactly once,
    /// whichever way the attempt ends.
    pub async fn invoke(mut self) -> Result<Value> {
        let deadline = Instant::now() + self.config.timeout;
        let started = Instant::now();

        let mut child = self.spawn()?;
        tracing::debug!(
            tool = %self.pending.tool,
            call_id = self.pending.id,
            pid = child.id(),
            "spawned worker"
        );

        let (stdin, stdout, stderr) = match take_pipes(&mut child, &self.config.interpreter) {
            Ok(pipes) => pipes,
            Err(e) => {
                terminate(&mut child).await;
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::channel(FRAME_QUEUE);
        let reader = tokio::spawn(pump_frames(stdout, tx));
        let stderr_task = tokio::spawn(capture_stderr(stderr));

        let driven = tokio::time::timeout_at(deadline, self.drive(stdin, rx)).await;
        let outcome = match driven {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::debug!(
                    tool = %self.pending.tool,
                    state = ?self.handshake.state(),
                    "worker deadline elapsed"
                );
                if !self.handshake.is_initialized() {
                    self.handshake.fail("deadline elapsed during handshake");
                }
                Err(McpError::Timeout(self.config.timeout))
            }
        };

        let status = terminate(&mut child).await;
        reader.abort();
        let stderr = collect_stderr(stderr_task).await;

        let outcome = match outcome {
            Err(McpError::ProcessExit {
                stderr: write_error,
                ..
            }) => Err(McpError::ProcessExit {
                status: status.and_then(|s| s.code()),
                stderr: if stderr.is_empty() { write_error } else { stderr },
            }),
            Err(McpError::Initialization(reason)) if !stderr.is_empty() => Err(
                McpError::initialization(format!("{reason}; worker stderr: {stderr}")),
            ),
            other => {
                if other.is_err() && !stderr.is_empty() {
                    tracing::debug!(tool = %self.pending.tool, stderr = %stderr, "worker stderr");
                }
                other
            }
        };

        tracing::debug!(
            tool = %self.pending.tool,
            call_id = self.pending.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "worker session finished"
        );

        outcome
    }

    /// Spawn `interpreter script` in the script's directory.
    fn spawn(&self) -> Result<Child> {
        let config = &self.config;
        let program = config.interpreter.display().to_string();

        let script = std::path::absolute(&config.script).map_err(|e| {
            McpError::spawn(
                &program,
                format!("invalid script path '{}': {e}", config.script.display()),
            )
        })?;
        let dir = script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let interpreter = if config.interpreter.components().count() > 1 {
            std::path::absolute(&config.interpreter).map_err(|e| McpError::spawn(&program, e))?
        } else {
            config.interpreter.clone()
        };

        let mut cmd = Command::new(&interpreter);
        cmd.arg(&script)
            .current_dir(&dir)
            .env(&config.search_path_var, &dir)
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.spawn().map_err(|e| {
            if dir.is_dir() {
                McpError::spawn(&program, e)
            } else {
                McpError::spawn(
                    &program,
                    format!("script directory '{}' is not accessible: {e}", dir.display()),
                )
            }
        })
    }

    /// Handshake, send the call, and wait for its response.
    async fn drive(
        &mut self,
        mut stdin: ChildStdin,
        mut frames: mpsc::Receiver<Value>,
    ) -> Result<Value> {
        let initialize = self.handshake.begin()?;
        if let Err(e) = write_message(&mut stdin, &initialize).await {
            return Err(self
                .handshake
                .fail(format!("failed to write initialize request: {e}")));
        }

        while let Some(frame) = frames.recv().await {
            let Some(response) = JsonRpcResponse::from_frame(frame) else {
                tracing::debug!(tool = %self.pending.tool, "ignoring non-response frame");
                continue;
            };

            if response.id == HANDSHAKE_ID {
                let outbound = self.handshake.on_response(response)?;
                for message in &outbound {
                    if let Err(e) = write_message(&mut stdin, message).await {
                        return Err(McpError::ProcessExit {
                            status: None,
                            stderr: format!("failed to write {}: {e}", message.method()),
                        });
                    }
                }
                if !outbound.is_empty() {
                    tracing::trace!(call_id = self.pending.id, "handshake complete, tool call sent");
                }
            } else if response.id == self.pending.id && self.handshake.is_initialized() {
                return self.pending.resolve(response);
            } else {
                tracing::debug!(id = response.id, "ignoring response with unexpected id");
            }
        }

        if self.handshake.is_initialized() {
            Err(McpError::ProcessExit {
                status: None,
                stderr: String::new(),
            })
        } else {
            Err(self
                .handshake
                .fail("worker exited before completing the handshake"))
        }
    }
}

fn take_pipes(
    child: &mut Child,
    interpreter: &Path,
) -> Result<(ChildStdin, ChildStdout, ChildStderr)> {
    let program = interpreter.display().to_string();
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| McpError::spawn(&program, "failed to capture stdin"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| McpError::spawn(&program, "failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| McpError::spawn(&program, "failed to capture stderr"))?;
    Ok((stdin, stdout, stderr))
}

async fn write_message(stdin: &mut ChildStdin, message: &Outbound) -> std::io::Result<()> {
    let line = message.to_line().map_err(std::io::Error::other)?;
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await?;
    tracing::trace!(method = message.method(), json = %line.trim_end(), "sent worker message");
    Ok(())
}

/// Feed stdout through a [`FrameParser`] until EOF, forwarding frames in order.
async fn pump_frames<R: AsyncRead + Unpin>(mut stdout: R, frames: mpsc::Sender<Value>) {
    let mut parser = FrameParser::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = match stdout.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "worker stdout read failed");
                break;
            }
        };
        for frame in parser.feed(&chunk[..n]) {
            if frames.send(frame).await.is_err() {
                return;
            }
        }
    }

    if !parser.is_empty() {
        tracing::debug!(
            bytes = parser.pending().len(),
            "discarding unterminated trailing worker output"
        );
    }
}

/// Read stderr until EOF, keeping only the last [`MAX_STDERR_BYTES`].
async fn capture_stderr<R: AsyncRead + Unpin>(mut stderr: R) -> String {
    let mut tail = Vec::with_capacity(MAX_STDERR_BYTES);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        match stderr.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => push_tail(&mut tail, &chunk[..n], MAX_STDERR_BYTES),
            Err(e) => {
                tracing::debug!(error = %e, "worker stderr read failed");
                break;
            }
        }
    }
    String::from_utf8_lossy(&tail).trim().to_string()
}

fn push_tail(tail: &mut Vec<u8>, bytes: &[u8], limit: usize) {
    tail.extend_from_slice(bytes);
    if tail.len() > limit {
        let excess = tail.len() - limit;
        tail.drain(..excess);
    }
}

async fn collect_stderr(task: JoinHandle<String>) -> String {
    let abort = task.abort_handle();
    match tokio::time::timeout(STDERR_GRACE, task).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "stderr capture task failed");
            String::new()
        }
        Err(_) => {
            abort.abort();
            String::new()
        }
    }
}

/// Kill the worker and reap it.
async fn terminate(child: &mut Child) -> Option<ExitStatus> {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "worker already exited before kill");
    }
    match child.wait().await {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::warn!(error = %e, "failed to reap worker process");
            None
        }
    }
}
