//! Wires the engine's own config/caller plumbing into a standalone
//! [`HeartbeatScheduler`], which runs independently of the host-callback
//! call sites in `transform.rs`/`observe.rs`/`tools.rs`.

use crate::engine::Engine;
use opencode_evolve_core::HostSdk;
use opencode_evolve_heartbeat::HeartbeatScheduler;
use opencode_evolve_hook::{HookCaller, HookIpc};
use std::sync::Arc;

impl<H: HostSdk> Engine<H> {
    /// Builds a heartbeat scheduler sharing this engine's session history
    /// map, session store, runtime state, and host, but with its own hook
    /// caller (the IPC layer has no shared mutable state beyond the
    /// `history` map, which is handed over explicitly) and workspace handle.
    pub fn build_heartbeat_scheduler(&self) -> anyhow::Result<Arc<HeartbeatScheduler<H>>> {
        let ipc = HookIpc::new(&self.workspace_root, &self.config.hook, self.config.hook_timeout());
        let caller = HookCaller::new(ipc, self.store.history_lookup());
        let workspace = self.open_workspace()?;

        Ok(Arc::new(HeartbeatScheduler::new(
            self.config.heartbeat_period(),
            self.config.heartbeat_title.clone(),
            self.config.heartbeat_agent.clone(),
            caller,
            Arc::clone(&self.host),
            Arc::clone(&self.store),
            Arc::clone(&self.runtime),
            workspace,
        )))
    }
}
