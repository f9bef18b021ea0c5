use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session identifier supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One captured `{ role, agent, parts }` message, as pushed onto the
/// `MessagesFifo` by `messages-transform` and popped by `system-transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub parts: Vec<serde_json::Value>,
}

/// A captured message history: the full ordered list of messages visible to
/// a prompt cycle at the time `messages-transform` ran.
pub type MessageHistory = Vec<CapturedMessage>;

/// A single text part synthesized by the plugin (injected notifications,
/// idle-continuation prompts, heartbeat prompts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticTextPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl SyntheticTextPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// A formatted part-list awaiting injection by the next `messages-transform`.
pub type PartList = Vec<SyntheticTextPart>;
