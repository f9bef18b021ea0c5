//! The `Engine`: one instance per loaded plugin, owning every component and
//! exposing the host callback surface (spec.md §2 component 10, §4).

use opencode_evolve_core::{HostSdk, SessionId, WorkspaceConfig};
use opencode_evolve_hook::{DebugLog, HookCaller, HookIpc};
use opencode_evolve_sandbox::Sandbox;
use opencode_evolve_session::{BuiltinTools, RuntimeStateStore, SessionStore, ToolRegistry};
use opencode_evolve_workspace::Workspace;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct Engine<H: HostSdk> {
    pub(crate) config: WorkspaceConfig,
    pub(crate) workspace_root: PathBuf,
    pub(crate) caller: HookCaller,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) runtime: Arc<RuntimeStateStore>,
    pub(crate) workspace: Workspace,
    pub(crate) builtins: BuiltinTools,
    pub(crate) tools: Mutex<ToolRegistry>,
    pub(crate) host: Arc<H>,
    /// Last agent id seen per session, for the idle-continuation fallback
    /// (spec.md §4.5 — "the session's known agent").
    pub(crate) last_agent: Mutex<HashMap<SessionId, String>>,
    #[allow(dead_code)]
    pub(crate) debug_log: Arc<DebugLog>,
}

impl<H: HostSdk> Engine<H> {
    /// Loads config, initializes the snapshot repository, and runs the
    /// hook's `discover` once to seed the tool registry.
    pub async fn load(workspace_root: impl Into<PathBuf>, host: Arc<H>) -> anyhow::Result<Self> {
        let workspace_root = workspace_root.into();
        let config = opencode_evolve_config::load(&workspace_root)?;

        let debug_log = Arc::new(DebugLog::new(config.debug_log_path.clone()));
        let history = Arc::new(RwLock::new(HashMap::new()));
        let ipc = HookIpc::new(&workspace_root, &config.hook, config.hook_timeout())
            .with_debug_log(Arc::clone(&debug_log));
        let caller = HookCaller::new(ipc, Arc::clone(&history));

        let store = Arc::new(SessionStore::new(history));
        let runtime = Arc::new(RuntimeStateStore::load(&workspace_root));
        let workspace = Workspace::new(&workspace_root)?;

        // `test_script` is resolved against the real workspace root — the
        // test command itself lives outside the disposable sandbox tree,
        // which only ever mirrors `traits/`/`prompts/` plus the candidate.
        let resolved_test_script = config
            .test_script
            .as_ref()
            .map(|relative| workspace_root.join(relative).to_string_lossy().into_owned());
        let sandbox = Sandbox::new(
            &workspace_root,
            &config.hook,
            resolved_test_script,
            config.hook_timeout(),
        );
        let builtin_workspace = Workspace::new(&workspace_root)?;
        let builtins = BuiltinTools::new(&workspace_root, &config.hook, builtin_workspace, sandbox);

        let stem = config.hook_stem();
        let mut tools = ToolRegistry::new(stem);
        let discover_output = caller.call("discover", serde_json::json!({}), None).await;
        tools.set_declared_from_discover(&discover_output);

        Ok(Self {
            config,
            workspace_root,
            caller,
            store,
            runtime,
            workspace,
            builtins,
            tools: Mutex::new(tools),
            host,
            last_agent: Mutex::new(HashMap::new()),
            debug_log,
        })
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    /// A fresh `Workspace` handle pointed at the same snapshot repository,
    /// for components (e.g. the heartbeat scheduler) that own their commits
    /// independently of the engine's own tool-dispatch commits.
    pub fn open_workspace(&self) -> anyhow::Result<Workspace> {
        Ok(Workspace::new(&self.workspace_root)?)
    }

    pub fn caller(&self) -> &HookCaller {
        &self.caller
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn runtime(&self) -> &Arc<RuntimeStateStore> {
        &self.runtime
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub(crate) async fn note_agent(&self, session_id: &SessionId, agent: &str) {
        self.last_agent
            .lock()
            .await
            .insert(session_id.clone(), agent.to_string());
    }

    pub(crate) async fn known_agent(&self, session_id: &SessionId) -> Option<String> {
        self.last_agent.lock().await.get(session_id).cloned()
    }

    /// Applies a hook output's `modified`/`notify`/`actions` fields — shared
    /// by the observation, tool-dispatch, and heartbeat call sites (spec.md
    /// §4.5, §4.6, §4.8).
    pub(crate) async fn apply_side_effects(
        &self,
        output: &serde_json::Value,
        source: &SessionId,
        commit_message: &str,
    ) {
        if output.get("modified").is_some() {
            if let Err(error) = self.workspace.commit(commit_message) {
                tracing::warn!(%error, commit_message, "workspace commit failed");
            }
        }

        if let Some(notify) = output.get("notify").and_then(|v| v.as_array()) {
            if !notify.is_empty() {
                match self.host.session_list().await {
                    Ok(sessions) => {
                        let ids: Vec<SessionId> = sessions.into_iter().map(|s| s.id).collect();
                        for value in notify {
                            self.store
                                .enqueue_notification_except(
                                    &ids,
                                    source,
                                    opencode_evolve_core::Notification::new(value.clone()),
                                )
                                .await;
                        }
                    }
                    Err(error) => tracing::warn!(%error, "failed to list sessions for notify"),
                }
            }
        }

        if let Some(actions) = output.get("actions").and_then(|v| v.as_array()) {
            let actions: Vec<opencode_evolve_core::ActionRecord> = actions
                .iter()
                .filter_map(|value| serde_json::from_value(value.clone()).ok())
                .collect();
            if !actions.is_empty() {
                let model = self.runtime.last_model().await;
                let agent = self
                    .known_agent(source)
                    .await
                    .unwrap_or_else(|| self.config.heartbeat_agent.clone());
                opencode_evolve_session::ActionExecutor::new(self.host.as_ref())
                    .execute_all(actions, &agent, model.as_ref())
                    .await;
            }
        }
    }
}
