use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recognized hook name (spec.md §6). Kept as a thin newtype rather than
/// an enum so a hook script can register arbitrary `discover`-provided tool
/// hooks without this crate needing to know their names in advance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookName(pub String);

impl HookName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this hook's failures are swallowed instead of triggering
    /// `recover` (spec.md §4.2 / §6).
    pub fn is_observational(&self) -> bool {
        OBSERVATIONAL_HOOKS.contains(&self.0.as_str())
    }
}

impl std::fmt::Display for HookName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HookName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// `tool_before`/`tool_after`/`observe_message`/`format_notification`: their
/// failures never cascade into `recover`.
pub const OBSERVATIONAL_HOOKS: &[&str] = &[
    "tool_before",
    "tool_after",
    "observe_message",
    "format_notification",
];

/// Transient record of one hook invocation, kept only for logging/timing.
#[derive(Debug, Clone, Serialize)]
pub struct HookInvocation {
    pub name: String,
    pub input: serde_json::Value,
    pub started_at: DateTime<Utc>,
}

impl HookInvocation {
    pub fn new(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            input,
            started_at: Utc::now(),
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}
