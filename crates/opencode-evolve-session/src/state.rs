//! Session state store (spec.md §4.4): frozen prompts, pending
//! notifications, and the two global FIFOs that correlate
//! `messages-transform` with the following `system-transform`.

use opencode_evolve_core::session::{MessageHistory, PartList};
use opencode_evolve_core::{Notification, SessionId};
use opencode_evolve_hook::caller::HistoryLookup;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

struct Inner {
    frozen: HashMap<SessionId, Vec<String>>,
    pending_notifications: HashMap<SessionId, VecDeque<Notification>>,
    messages_fifo: VecDeque<MessageHistory>,
    injection_fifo: VecDeque<PartList>,
}

/// All process-lifetime mutable state the core depends on for prompt
/// stability and cross-callback correlation (spec.md §3).
pub struct SessionStore {
    inner: Mutex<Inner>,
    /// Shared with `HookCaller` so a frozen `system_history[session_id]`
    /// write here is visible as the `history` field on the next hook call.
    history: HistoryLookup,
}

impl SessionStore {
    pub fn new(history: HistoryLookup) -> Self {
        Self {
            inner: Mutex::new(Inner {
                frozen: HashMap::new(),
                pending_notifications: HashMap::new(),
                messages_fifo: VecDeque::new(),
                injection_fifo: VecDeque::new(),
            }),
            history,
        }
    }

    /// The shared history map, handed to `HookCaller::new`.
    pub fn history_lookup(&self) -> HistoryLookup {
        self.history.clone()
    }

    pub async fn frozen_prompt(&self, session_id: &SessionId) -> Option<Vec<String>> {
        self.inner.lock().await.frozen.get(session_id).cloned()
    }

    /// Installs `system` as the frozen prompt for `session_id`. Invariant
    /// (spec.md §3): never overwrites an existing entry.
    pub async fn freeze(&self, session_id: &SessionId, system: Vec<String>) {
        let mut inner = self.inner.lock().await;
        inner.frozen.entry(session_id.clone()).or_insert(system);
    }

    pub async fn push_messages(&self, history: MessageHistory) {
        self.inner.lock().await.messages_fifo.push_back(history);
    }

    pub async fn pop_messages(&self) -> Option<MessageHistory> {
        self.inner.lock().await.messages_fifo.pop_front()
    }

    /// Overwrites `session_id`'s entry in the shared history map (spec.md
    /// §4.4 step 2 — "store it as session_history[session_id]").
    pub async fn record_history(&self, session_id: &SessionId, history: MessageHistory) {
        self.history.write().await.insert(session_id.clone(), history);
    }

    pub async fn push_injection(&self, parts: PartList) {
        self.inner.lock().await.injection_fifo.push_back(parts);
    }

    pub async fn pop_injection(&self) -> Option<PartList> {
        self.inner.lock().await.injection_fifo.pop_front()
    }

    pub async fn enqueue_notification(&self, session_id: &SessionId, notification: Notification) {
        self.inner
            .lock()
            .await
            .pending_notifications
            .entry(session_id.clone())
            .or_default()
            .push_back(notification);
    }

    /// Enqueues `notification` for every session in `targets` except
    /// `source` (spec.md §4.4 invariant (b): never delivered back to its
    /// source session).
    pub async fn enqueue_notification_except(
        &self,
        targets: &[SessionId],
        source: &SessionId,
        notification: Notification,
    ) {
        let mut inner = self.inner.lock().await;
        for target in targets {
            if target == source {
                continue;
            }
            inner
                .pending_notifications
                .entry(target.clone())
                .or_default()
                .push_back(notification.clone());
        }
    }

    pub async fn has_pending_notifications(&self, session_id: &SessionId) -> bool {
        self.inner
            .lock()
            .await
            .pending_notifications
            .get(session_id)
            .map(|queue| !queue.is_empty())
            .unwrap_or(false)
    }

    /// Drains and returns every pending notification for `session_id`.
    pub async fn drain_notifications(&self, session_id: &SessionId) -> Vec<Notification> {
        self.inner
            .lock()
            .await
            .pending_notifications
            .get_mut(session_id)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }
}
