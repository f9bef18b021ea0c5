//! Heartbeat scheduler (spec.md §4.8, §2 component 9): a single repeating
//! timer that skips its next tick while the previous one is still running.

use opencode_evolve_core::{ActionRecord, HostSdk, Notification, SessionId};
use opencode_evolve_hook::HookCaller;
use opencode_evolve_session::{ActionExecutor, RuntimeStateStore, SessionStore};
use opencode_evolve_workspace::Workspace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ran,
    Skipped,
}

pub struct HeartbeatScheduler<H: HostSdk> {
    period: Duration,
    title: String,
    agent: String,
    caller: HookCaller,
    host: Arc<H>,
    store: Arc<SessionStore>,
    runtime: Arc<RuntimeStateStore>,
    workspace: Workspace,
    in_progress: AtomicBool,
    cached_session_id: Mutex<Option<SessionId>>,
}

impl<H: HostSdk> HeartbeatScheduler<H> {
    pub fn new(
        period: Duration,
        title: impl Into<String>,
        agent: impl Into<String>,
        caller: HookCaller,
        host: Arc<H>,
        store: Arc<SessionStore>,
        runtime: Arc<RuntimeStateStore>,
        workspace: Workspace,
    ) -> Self {
        Self {
            period,
            title: title.into(),
            agent: agent.into(),
            caller,
            host,
            store,
            runtime,
            workspace,
            in_progress: AtomicBool::new(false),
            cached_session_id: Mutex::new(None),
        }
    }

    /// Runs the timer forever. Each fire spawns an independent tick task so
    /// a slow tick cannot block the next timer fire from being observed and
    /// coalesced (spec.md §5 "heartbeat overlap: coalesced").
    pub async fn run(self: Arc<Self>) -> ! {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                this.tick_once().await;
            });
        }
    }

    /// Runs exactly one guarded tick: skips (and logs) if a previous tick is
    /// still in flight, otherwise does the work and always clears the guard.
    pub async fn tick_once(&self) -> TickOutcome {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            tracing::info!("heartbeat tick skipped: previous tick still in progress");
            return TickOutcome::Skipped;
        }

        struct Guard<'a>(&'a AtomicBool);
        impl Drop for Guard<'_> {
            fn drop(&mut self) {
                self.0.store(false, Ordering::SeqCst);
            }
        }
        let _guard = Guard(&self.in_progress);

        self.tick().await;
        TickOutcome::Ran
    }

    async fn tick(&self) {
        let session_id = match self.resolve_heartbeat_session().await {
            Ok(id) => id,
            Err(error) => {
                tracing::warn!(%error, "heartbeat: failed to resolve heartbeat session");
                return;
            }
        };

        let Some(model) = self.runtime.last_model().await else {
            tracing::info!("heartbeat: no known model yet, aborting tick");
            return;
        };

        let output = self
            .caller
            .call(
                "heartbeat",
                serde_json::json!({ "sessions": [] }),
                Some(&session_id),
            )
            .await;

        if let Some(text) = output.get("user").and_then(|v| v.as_str()) {
            let message = format!("[heartbeat] {text}");
            if let Err(error) = self
                .host
                .session_prompt(&session_id, &self.agent, &model, &message)
                .await
            {
                tracing::warn!(%error, "heartbeat: failed to send prompt");
            }
        }

        self.apply_side_effects(&output, &session_id).await;
    }

    async fn resolve_heartbeat_session(&self) -> anyhow::Result<SessionId> {
        if let Some(id) = self.cached_session_id.lock().await.clone() {
            return Ok(id);
        }

        let sessions = self.host.session_list().await?;
        let found = sessions.into_iter().find(|s| s.title == self.title).map(|s| s.id);
        let session_id = match found {
            Some(id) => id,
            None => self.host.session_create(&self.title).await?,
        };

        *self.cached_session_id.lock().await = Some(session_id.clone());
        Ok(session_id)
    }

    async fn apply_side_effects(&self, output: &serde_json::Value, source: &SessionId) {
        if output.get("modified").is_some() {
            if let Err(error) = self.workspace.commit("heartbeat update") {
                tracing::warn!(%error, "heartbeat: workspace commit failed");
            }
        }

        if let Some(notify) = output.get("notify").and_then(|v| v.as_array()) {
            if !notify.is_empty() {
                match self.host.session_list().await {
                    Ok(sessions) => {
                        let ids: Vec<SessionId> = sessions.into_iter().map(|s| s.id).collect();
                        for value in notify {
                            self.store
                                .enqueue_notification_except(&ids, source, Notification::new(value.clone()))
                                .await;
                        }
                    }
                    Err(error) => tracing::warn!(%error, "heartbeat: failed to list sessions for notify"),
                }
            }
        }

        if let Some(actions) = output.get("actions").and_then(|v| v.as_array()) {
            let actions: Vec<ActionRecord> = actions
                .iter()
                .filter_map(|value| serde_json::from_value(value.clone()).ok())
                .collect();
            if !actions.is_empty() {
                let model = self.runtime.last_model().await;
                ActionExecutor::new(self.host.as_ref())
                    .execute_all(actions, &self.agent, model.as_ref())
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opencode_evolve_core::host::SessionSummary;
    use opencode_evolve_core::ModelId;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::RwLock;

    struct FakeHost {
        sessions: Mutex<Vec<SessionSummary>>,
        prompts: Mutex<Vec<String>>,
        created: AtomicUsize,
    }

    #[async_trait]
    impl HostSdk for FakeHost {
        async fn session_create(&self, title: &str) -> anyhow::Result<SessionId> {
            self.created.fetch_add(1, Ordering::SeqCst);
            let id = SessionId::new(format!("created-{title}"));
            self.sessions.lock().await.push(SessionSummary {
                id: id.clone(),
                title: title.to_string(),
            });
            Ok(id)
        }

        async fn session_list(&self) -> anyhow::Result<Vec<SessionSummary>> {
            Ok(self.sessions.lock().await.clone())
        }

        async fn session_prompt(
            &self,
            _session_id: &SessionId,
            _agent: &str,
            _model: &ModelId,
            text: &str,
        ) -> anyhow::Result<()> {
            self.prompts.lock().await.push(text.to_string());
            Ok(())
        }

        async fn session_prompt_async(
            &self,
            _session_id: &SessionId,
            _agent: &str,
            _model: &ModelId,
            text: &str,
        ) -> anyhow::Result<()> {
            self.prompts.lock().await.push(text.to_string());
            Ok(())
        }
    }

    fn write_hook(dir: &std::path::Path, script: &str) {
        let hooks_dir = dir.join("hooks");
        std::fs::create_dir_all(&hooks_dir).unwrap();
        let path = hooks_dir.join("evolve.py");
        std::fs::write(&path, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    async fn scheduler_with_hook(
        dir: &std::path::Path,
        script: &str,
        period: Duration,
    ) -> (Arc<HeartbeatScheduler<FakeHost>>, Arc<FakeHost>) {
        write_hook(dir, script);
        let ipc = opencode_evolve_hook::HookIpc::new(dir, "evolve.py", Duration::from_secs(5));
        let history = Arc::new(RwLock::new(HashMap::new()));
        let caller = HookCaller::new(ipc, history);
        let host = Arc::new(FakeHost {
            sessions: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
        });
        let store = Arc::new(SessionStore::new(Arc::new(RwLock::new(HashMap::new()))));
        let runtime = Arc::new(RuntimeStateStore::load(dir));
        runtime
            .set_model_if_changed(ModelId::new("anthropic", "claude"))
            .await;
        let workspace = Workspace::new(dir).unwrap();

        let scheduler = Arc::new(HeartbeatScheduler::new(
            period,
            "heartbeat",
            "evolve",
            caller,
            Arc::clone(&host),
            store,
            runtime,
            workspace,
        ));
        (scheduler, host)
    }

    #[tokio::test]
    async fn no_known_model_aborts_the_tick() {
        let dir = tempfile::tempdir().unwrap();
        write_hook(dir.path(), "#!/bin/sh\necho '{}'\n");
        let ipc = opencode_evolve_hook::HookIpc::new(dir.path(), "evolve.py", Duration::from_secs(5));
        let caller = HookCaller::new(ipc, Arc::new(RwLock::new(HashMap::new())));
        let host = Arc::new(FakeHost {
            sessions: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
        });
        let store = Arc::new(SessionStore::new(Arc::new(RwLock::new(HashMap::new()))));
        let runtime = Arc::new(RuntimeStateStore::load(dir.path()));
        let workspace = Workspace::new(dir.path()).unwrap();
        let scheduler = HeartbeatScheduler::new(
            Duration::from_secs(60),
            "heartbeat",
            "evolve",
            caller,
            Arc::clone(&host),
            store,
            runtime,
            workspace,
        );

        assert_eq!(scheduler.tick_once().await, TickOutcome::Ran);
        assert!(host.prompts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn heartbeat_user_text_is_sent_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let (scheduler, host) =
            scheduler_with_hook(dir.path(), "#!/bin/sh\necho '{\"user\":\"status?\"}'\n", Duration::from_secs(60)).await;

        scheduler.tick_once().await;
        let prompts = host.prompts.lock().await;
        assert_eq!(prompts.as_slice(), ["[heartbeat] status?"]);
    }

    #[tokio::test]
    async fn overlapping_ticks_coalesce_the_second_one() {
        let dir = tempfile::tempdir().unwrap();
        let (scheduler, _host) = scheduler_with_hook(
            dir.path(),
            "#!/bin/sh\nsleep 0.3\necho '{}'\n",
            Duration::from_secs(60),
        )
        .await;

        let first = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.tick_once().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = scheduler.tick_once().await;

        assert_eq!(second, TickOutcome::Skipped);
        assert_eq!(first.await.unwrap(), TickOutcome::Ran);
    }

    #[tokio::test]
    async fn heartbeat_session_is_created_once_and_then_cached() {
        let dir = tempfile::tempdir().unwrap();
        let (scheduler, host) = scheduler_with_hook(dir.path(), "#!/bin/sh\necho '{}'\n", Duration::from_secs(60)).await;

        scheduler.tick_once().await;
        scheduler.tick_once().await;
        assert_eq!(host.created.load(Ordering::SeqCst), 1);
    }
}
