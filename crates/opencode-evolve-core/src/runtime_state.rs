use crate::model::ModelId;
use serde::{Deserialize, Serialize};

/// Persisted `<workspace>/config/runtime.json`: the last-observed LLM
/// identity, so heartbeats can resume without awaiting a fresh user turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeState {
    pub model: Option<ModelId>,
}
