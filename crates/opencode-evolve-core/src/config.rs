use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolved, immutable plugin configuration. Created once at load time by
/// `opencode-evolve-config` and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Hook script basename under `hooks/`.
    pub hook: String,
    /// Heartbeat period, in milliseconds.
    pub heartbeat_ms: u64,
    /// Per-subprocess timeout, in milliseconds.
    pub hook_timeout: u64,
    /// Title used to find/create the background heartbeat session.
    pub heartbeat_title: String,
    /// Agent identifier used for injected prompts.
    pub heartbeat_agent: String,
    /// Glyph prefix for log/output lines.
    pub prefix: String,
    /// Relative path (from the workspace root) to the sandbox test command.
    pub test_script: Option<String>,
    /// Optional file the debug log is mirrored to, in addition to stderr.
    pub debug_log_path: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            hook: "evolve.py".to_string(),
            heartbeat_ms: 1_800_000,
            hook_timeout: 30_000,
            heartbeat_title: "heartbeat".to_string(),
            heartbeat_agent: "evolve".to_string(),
            prefix: "\u{1F9EC}".to_string(),
            test_script: None,
            debug_log_path: None,
        }
    }
}

impl WorkspaceConfig {
    /// The hook's file stem, used to prefix every registered tool name
    /// (`<hook_stem>_<name>`) and to rename every tool uniformly when the
    /// hook script is swapped.
    pub fn hook_stem(&self) -> String {
        PathBuf::from(&self.hook)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.hook.clone())
    }

    pub fn hook_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.hook_timeout)
    }

    pub fn heartbeat_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_ms)
    }
}
