use crate::model::ModelId;
use crate::session::SessionId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A session as reported by the host's session-list call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
}

/// The host SDK surface this plugin consumes (spec.md §6). The chat host
/// itself — session/message CRUD, LLM streaming, tool registration — is out
/// of scope; this trait is the seam a real host adapter implements.
#[async_trait]
pub trait HostSdk: Send + Sync {
    /// Create a new session with the given title, returning its id.
    async fn session_create(&self, title: &str) -> anyhow::Result<SessionId>;

    /// List all known sessions.
    async fn session_list(&self) -> anyhow::Result<Vec<SessionSummary>>;

    /// Send a blocking prompt to a session and wait for the turn to finish.
    async fn session_prompt(
        &self,
        session_id: &SessionId,
        agent: &str,
        model: &ModelId,
        text: &str,
    ) -> anyhow::Result<()>;

    /// Send a fire-and-forget prompt to a session.
    async fn session_prompt_async(
        &self,
        session_id: &SessionId,
        agent: &str,
        model: &ModelId,
        text: &str,
    ) -> anyhow::Result<()>;
}
