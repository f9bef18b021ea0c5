//! The `messages-transform` / `system-transform` pair (spec.md §4.4): the
//! FIFO-correlated core of prompt freezing and notification injection.

use crate::engine::Engine;
use opencode_evolve_core::session::{CapturedMessage, MessageHistory, SyntheticTextPart};
use opencode_evolve_core::{HostSdk, SessionId, AGENT_MARKER};

impl<H: HostSdk> Engine<H> {
    /// `messages-transform(input: {}, output: { messages })`.
    pub async fn messages_transform(&self, messages: MessageHistory) -> MessageHistory {
        self.store.push_messages(messages.clone()).await;

        let mut output = messages;
        if let Some(parts) = self.store.pop_injection().await {
            output.push(CapturedMessage {
                role: "user".to_string(),
                agent: None,
                parts: parts
                    .into_iter()
                    .map(|part| serde_json::to_value(part).unwrap_or(serde_json::Value::Null))
                    .collect(),
            });
        }
        output
    }

    /// `system-transform(input: { session_id, model }, output: { system })`.
    pub async fn system_transform(&self, session_id: &SessionId, mut system: Vec<String>) -> Vec<String> {
        if !system.iter().any(|line| line.contains(AGENT_MARKER)) {
            return system;
        }

        if let Some(history) = self.store.pop_messages().await {
            self.store.record_history(session_id, history).await;
        }

        if let Some(frozen) = self.store.frozen_prompt(session_id).await {
            system = frozen;
        } else {
            let output = self
                .caller
                .call(
                    "mutate_request",
                    serde_json::json!({ "session": { "id": session_id.as_str() } }),
                    Some(session_id),
                )
                .await;
            if let Some(new_system) = output.get("system").and_then(|v| v.as_array()) {
                let new_system: Vec<String> = new_system
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                if !new_system.is_empty() {
                    system = new_system.clone();
                    self.store.freeze(session_id, new_system).await;
                }
            }
        }

        if self.store.has_pending_notifications(session_id).await {
            let drained = self.store.drain_notifications(session_id).await;
            let payload: Vec<serde_json::Value> = drained.into_iter().map(|n| n.0).collect();
            let output = self
                .caller
                .call(
                    "format_notification",
                    serde_json::json!({ "notifications": payload }),
                    Some(session_id),
                )
                .await;
            if let Some(message) = output.get("message").and_then(|v| v.as_str()) {
                let wrapped = format!("<internal-notification>\n{message}\n</internal-notification>");
                self.store
                    .push_injection(vec![SyntheticTextPart::text(wrapped)])
                    .await;
            }
        }

        system
    }
}
