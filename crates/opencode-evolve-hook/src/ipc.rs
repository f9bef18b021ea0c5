//! Hook IPC (spec.md §4.1): spawns the hook binary as a child process per
//! invocation, writes a single JSON document to its stdin, reads its stdout
//! until exit, enforces a timeout by killing on elapse, forwards its stderr
//! to the debug log, and parses stdout as newline-delimited JSON whose
//! objects are merged left-to-right (sink `{"log": ...}` lines redirected
//! to the log).

use crate::debug_log::DebugLog;
use crate::registry::{self, ProcessKind};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum HookIpcError {
    #[error("failed to spawn hook process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("hook i/o error: {0}")]
    Io(#[source] std::io::Error),
    #[error("timeout")]
    Timeout,
    #[error("exit {0}")]
    NonZeroExit(String),
    #[error("malformed hook output: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Spawns `<workspace>/hooks/<hook>` once per call and speaks the JSONL
/// protocol described in spec.md §6.
pub struct HookIpc {
    workspace: PathBuf,
    hook_relative_path: String,
    timeout: Duration,
    debug_log: Arc<DebugLog>,
}

impl HookIpc {
    pub fn new(workspace: impl Into<PathBuf>, hook: impl Into<String>, timeout: Duration) -> Self {
        Self {
            workspace: workspace.into(),
            hook_relative_path: hook.into(),
            timeout,
            debug_log: Arc::new(DebugLog::default()),
        }
    }

    pub fn with_debug_log(mut self, debug_log: Arc<DebugLog>) -> Self {
        self.debug_log = debug_log;
        self
    }

    fn hook_path(&self) -> PathBuf {
        self.workspace.join("hooks").join(&self.hook_relative_path)
    }

    /// `invoke(name, input_object) -> output_object`.
    pub async fn invoke(&self, name: &str, input: Value) -> Result<Value, HookIpcError> {
        let hook_path = self.hook_path();
        if !hook_path.exists() {
            self.debug_log
                .line("ipc", &format!("hook absent, no-op for '{name}'"));
            return Ok(Value::Object(Map::new()));
        }

        self.run(&hook_path, name, input).await
    }

    async fn run(&self, hook_path: &Path, name: &str, input: Value) -> Result<Value, HookIpcError> {
        let body = serde_json::to_vec(&input).map_err(HookIpcError::Malformed)?;

        let mut child = Command::new(hook_path)
            .arg(name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(HookIpcError::Spawn)?;

        if let Some(pid) = child.id() {
            registry::global().register(pid, name.to_string(), ProcessKind::Hook);
        }

        let mut stdin = child.stdin.take().ok_or_else(|| {
            HookIpcError::Io(std::io::Error::other("hook subprocess has no stdin"))
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            HookIpcError::Io(std::io::Error::other("hook subprocess has no stdout"))
        })?;
        let stderr = child.stderr.take();

        if let Some(stderr) = stderr {
            let debug_log = Arc::clone(&self.debug_log);
            let label = name.to_string();
            tokio::spawn(async move {
                forward_stderr(label, stderr, debug_log).await;
            });
        }

        let result = tokio::time::timeout(self.timeout, async {
            stdin.write_all(&body).await?;
            drop(stdin);

            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((buf, status))
        })
        .await;

        if let Some(pid) = child.id() {
            registry::global().unregister(pid);
        }

        let (buf, status) = match result {
            Ok(Ok(pair)) => pair,
            Ok(Err(io_err)) => return Err(HookIpcError::Io(io_err)),
            Err(_elapsed) => {
                let _ = child.start_kill();
                return Err(HookIpcError::Timeout);
            }
        };

        if !status.success() {
            let described = status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| describe_signal(&status));
            return Err(HookIpcError::NonZeroExit(described));
        }

        self.parse_jsonl(&buf)
    }

    fn parse_jsonl(&self, buf: &[u8]) -> Result<Value, HookIpcError> {
        let text = String::from_utf8_lossy(buf);
        let mut accumulator = Map::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(HookIpcError::Malformed)?;
            let Value::Object(object) = value else {
                return Err(HookIpcError::Malformed(
                    <serde_json::Error as serde::de::Error>::custom(
                        "hook output line is not a JSON object",
                    ),
                ));
            };

            if let Some(Value::String(message)) = object.get("log") {
                self.debug_log.line("hook", message);
                continue;
            }

            for (key, value) in object {
                accumulator.insert(key, value);
            }
        }

        Ok(Value::Object(accumulator))
    }
}

async fn forward_stderr(label: String, stderr: tokio::process::ChildStderr, debug_log: Arc<DebugLog>) {
    let mut reader = BufReader::new(stderr);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let msg = line.trim_end();
                if !msg.is_empty() {
                    debug_log.line(&label, msg);
                }
            }
            Err(_) => break,
        }
    }
}

#[cfg(unix)]
fn describe_signal(status: &std::process::ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    status
        .signal()
        .map(|sig| format!("signal {sig}"))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(not(unix))]
fn describe_signal(_status: &std::process::ExitStatus) -> String {
    "unknown".to_string()
}
