//! Persisted `last_model` cache (spec.md §3 `RuntimeState`, §6 persisted
//! state): read once at startup, rewritten only when the observed model
//! changes so heartbeats can run without a live user turn.

use opencode_evolve_core::{ModelId, RuntimeState};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub fn runtime_state_path(workspace: &Path) -> PathBuf {
    workspace.join("config").join("runtime.json")
}

pub struct RuntimeStateStore {
    path: PathBuf,
    state: RwLock<RuntimeState>,
}

impl RuntimeStateStore {
    /// Reads the persisted state at `<workspace>/config/runtime.json`, or
    /// starts from defaults if absent or unreadable.
    pub fn load(workspace: &Path) -> Self {
        let path = runtime_state_path(workspace);
        let state = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub async fn last_model(&self) -> Option<ModelId> {
        self.state.read().await.model.clone()
    }

    /// Updates the cached model and persists it, but only if it actually
    /// changed — avoids a torn write on every observation of the same turn.
    pub async fn set_model_if_changed(&self, model: ModelId) {
        {
            let current = self.state.read().await;
            if current.model.as_ref() == Some(&model) {
                return;
            }
        }

        let mut guard = self.state.write().await;
        if guard.model.as_ref() == Some(&model) {
            return;
        }
        guard.model = Some(model);

        if let Some(parent) = self.path.parent() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                tracing::warn!(%error, "failed to create runtime state directory");
                return;
            }
        }
        match serde_json::to_string_pretty(&*guard) {
            Ok(json) => {
                if let Err(error) = std::fs::write(&self.path, json) {
                    tracing::warn!(%error, "failed to persist runtime state");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to serialize runtime state"),
        }
    }
}
