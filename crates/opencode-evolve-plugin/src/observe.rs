//! Chat-message observation and idle continuation (spec.md §4.5).

use crate::engine::Engine;
use opencode_evolve_core::{HostSdk, ModelId, SessionId};

/// One observed assistant turn, as extracted from `output.parts` by the
/// host adapter.
pub struct ObservedTurn {
    pub session_id: SessionId,
    pub agent: String,
    pub reasoning: String,
    pub tool_calls: Vec<serde_json::Value>,
    pub answer: String,
    pub model: Option<ModelId>,
}

impl<H: HostSdk> Engine<H> {
    pub async fn observe_message(&self, turn: ObservedTurn) {
        self.note_agent(&turn.session_id, &turn.agent).await;
        if let Some(model) = turn.model.clone() {
            self.runtime.set_model_if_changed(model).await;
        }

        let output = self
            .caller
            .call(
                "observe_message",
                serde_json::json!({
                    "reasoning": turn.reasoning,
                    "tool_calls": turn.tool_calls,
                    "answer": turn.answer,
                    "session": { "id": turn.session_id.as_str(), "agent": turn.agent },
                }),
                Some(&turn.session_id),
            )
            .await;

        let had_tool_calls = !turn.tool_calls.is_empty();
        self.apply_side_effects(&output, &turn.session_id, &format!("observe {}", turn.session_id))
            .await;

        if had_tool_calls {
            return;
        }

        let idle_output = self
            .caller
            .call(
                "idle",
                serde_json::json!({ "answer": turn.answer }),
                Some(&turn.session_id),
            )
            .await;

        let Some(continue_text) = idle_output.get("continue").and_then(|v| v.as_str()) else {
            return;
        };
        if continue_text.is_empty() {
            return;
        }

        let agent = self
            .known_agent(&turn.session_id)
            .await
            .unwrap_or_else(|| self.config.heartbeat_agent.clone());
        let Some(model) = self.runtime.last_model().await else {
            tracing::warn!(session_id = %turn.session_id, "idle continuation dropped: no known model");
            return;
        };

        if let Err(error) = self
            .host
            .session_prompt_async(&turn.session_id, &agent, &model, continue_text)
            .await
        {
            tracing::warn!(session_id = %turn.session_id, %error, "idle continuation prompt failed");
        }
    }
}
