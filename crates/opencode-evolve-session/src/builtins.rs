//! Built-in tools (spec.md §4.6 table): `prompt_*` and `hook_*`, always
//! present so the agent can repair a broken hook through them even when the
//! hook's own `discover` cannot run.

use crate::patch::single_occurrence_patch;
use opencode_evolve_core::Notification;
use opencode_evolve_sandbox::{Sandbox, ValidationOutcome};
use opencode_evolve_workspace::Workspace;
use std::path::PathBuf;

/// Result of a successful mutating built-in: the textual result the tool
/// call returns, plus an optional notification to fan out to other live
/// sessions (only `prompt_write` produces one, per the spec's table).
pub struct BuiltinOutcome {
    pub result: String,
    pub notify: Option<Notification>,
}

impl BuiltinOutcome {
    fn done(notify: Option<Notification>) -> Self {
        Self {
            result: "done".to_string(),
            notify,
        }
    }
}

pub struct BuiltinTools {
    workspace_root: PathBuf,
    hook_name: String,
    workspace: Workspace,
    sandbox: Sandbox,
}

impl BuiltinTools {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        hook_name: impl Into<String>,
        workspace: Workspace,
        sandbox: Sandbox,
    ) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            hook_name: hook_name.into(),
            workspace,
            sandbox,
        }
    }

    fn prompts_dir(&self) -> PathBuf {
        self.workspace_root.join("prompts")
    }

    fn prompt_path(&self, name: &str) -> PathBuf {
        self.prompts_dir().join(name)
    }

    fn hook_path(&self) -> PathBuf {
        self.workspace_root.join("hooks").join(&self.hook_name)
    }

    fn commit(&self, message: &str) {
        if let Err(error) = self.workspace.commit(message) {
            // Version-control failures are logged and otherwise ignored
            // (spec.md §7): they never fail a user-visible tool call.
            tracing::warn!(%error, message, "workspace commit failed");
        }
    }

    pub fn prompt_list(&self) -> Result<Vec<String>, String> {
        let dir = self.prompts_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|error| error.to_string())?;
            if entry.file_type().is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    if name.ends_with(".md") {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn prompt_read(&self, name: &str) -> Result<String, String> {
        std::fs::read_to_string(self.prompt_path(name)).map_err(|error| error.to_string())
    }

    pub fn prompt_write(&self, name: &str, content: &str) -> Result<BuiltinOutcome, String> {
        let path = self.prompt_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| error.to_string())?;
        }
        std::fs::write(&path, content).map_err(|error| error.to_string())?;
        self.commit(&format!("update prompt {name}"));
        Ok(BuiltinOutcome::done(Some(Notification::new(
            serde_json::json!({"type": "trait_changed", "name": name}),
        ))))
    }

    pub fn prompt_patch(&self, name: &str, old: &str, new: &str) -> Result<BuiltinOutcome, String> {
        let current = self.prompt_read(name)?;
        let patched = single_occurrence_patch(&current, old, new).map_err(|error| error.to_string())?;
        let path = self.prompt_path(name);
        std::fs::write(&path, patched).map_err(|error| error.to_string())?;
        self.commit(&format!("patch prompt {name}"));
        Ok(BuiltinOutcome::done(None))
    }

    pub async fn hook_validate(&self, content: &str) -> ValidationOutcome {
        self.sandbox.validate(content.as_bytes()).await
    }

    pub fn hook_read(&self) -> Result<String, String> {
        std::fs::read_to_string(self.hook_path()).map_err(|error| error.to_string())
    }

    pub async fn hook_write(&self, content: &str) -> Result<BuiltinOutcome, String> {
        let outcome = self.hook_validate(content).await;
        if !outcome.ok {
            return Err(format!("validation failed: {}", outcome.output));
        }

        let path = self.hook_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| error.to_string())?;
        }
        std::fs::write(&path, content).map_err(|error| error.to_string())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .map_err(|error| error.to_string())?;
        }

        self.commit("update hook");
        Ok(BuiltinOutcome::done(None))
    }

    pub async fn hook_patch(&self, old: &str, new: &str) -> Result<BuiltinOutcome, String> {
        let current = self.hook_read()?;
        let patched = single_occurrence_patch(&current, old, new).map_err(|error| error.to_string())?;
        self.hook_write(&patched).await
    }
}
