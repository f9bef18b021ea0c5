//! Hook Caller with recover cascade (spec.md §4.2).
//!
//! `call(name, context, session_id?) -> merged_output_or_{}` — errors never
//! escape; observational hooks swallow their own failures, non-observational
//! hooks get exactly one `recover` attempt whose own failure is swallowed.

use crate::ipc::HookIpc;
use opencode_evolve_core::session::MessageHistory;
use opencode_evolve_core::{HookInvocation, HookName, SessionId};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Looks up a session's most recently captured message history, used to
/// populate the optional `history` field on hook input (spec.md §4.2).
pub type HistoryLookup = Arc<RwLock<HashMap<SessionId, MessageHistory>>>;

pub struct HookCaller {
    ipc: HookIpc,
    history: HistoryLookup,
}

impl HookCaller {
    pub fn new(ipc: HookIpc, history: HistoryLookup) -> Self {
        Self { ipc, history }
    }

    /// `call(name, context, session_id?) -> merged_output_or_{}`.
    pub async fn call(
        &self,
        name: &str,
        context: Value,
        session_id: Option<&SessionId>,
    ) -> Value {
        self.call_inner(name, context, session_id, true).await
    }

    fn call_inner<'a>(
        &'a self,
        name: &'a str,
        context: Value,
        session_id: Option<&'a SessionId>,
        allow_recover: bool,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Value> + Send + 'a>> {
        Box::pin(async move {
            let input = self.build_input(name, context, session_id).await;
            let invocation = HookInvocation::new(name, input.clone());

            match self.ipc.invoke(name, input).await {
                Ok(output) => {
                    tracing::debug!(
                        hook = name,
                        elapsed_ms = invocation.elapsed_ms(),
                        "hook call succeeded"
                    );
                    output
                }
                Err(error) => {
                    tracing::warn!(hook = name, %error, "hook call failed");

                    if HookName::new(name).is_observational() {
                        return Value::Object(Map::new());
                    }

                    if !allow_recover {
                        // Base case: `recover` itself failed; swallow.
                        return Value::Object(Map::new());
                    }

                    let recover_context = serde_json::json!({
                        "error": error.to_string(),
                        "failed_hook": name,
                    });
                    // Recover's own returned system/user pair is intentionally
                    // discarded at this call site (see DESIGN.md open question c).
                    let _ = self
                        .call_inner("recover", recover_context, session_id, false)
                        .await;
                    Value::Object(Map::new())
                }
            }
        })
    }

    async fn build_input(
        &self,
        name: &str,
        context: Value,
        session_id: Option<&SessionId>,
    ) -> Value {
        let mut object = match context {
            Value::Object(object) => object,
            Value::Null => Map::new(),
            other => {
                let mut object = Map::new();
                object.insert("context".to_string(), other);
                object
            }
        };
        object.insert("hook".to_string(), Value::String(name.to_string()));

        if let Some(session_id) = session_id {
            let history = self.history.read().await;
            if let Some(history) = history.get(session_id) {
                object.insert(
                    "history".to_string(),
                    serde_json::to_value(history).unwrap_or(Value::Null),
                );
            }
        }

        Value::Object(object)
    }
}
