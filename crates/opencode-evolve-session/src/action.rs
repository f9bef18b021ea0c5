//! Action executor (spec.md §4.5 / §2 component 8): translates hook-
//! returned action objects into host SDK calls.

use opencode_evolve_core::{ActionRecord, HostSdk, ModelId};

/// Dispatches `actions[]` against the host SDK. An individual action's
/// failure is logged and the remaining actions are still attempted (spec.md
/// §7, action-failure policy).
pub struct ActionExecutor<'a> {
    host: &'a dyn HostSdk,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(host: &'a dyn HostSdk) -> Self {
        Self { host }
    }

    pub async fn execute_all(&self, actions: Vec<ActionRecord>, agent: &str, model: Option<&ModelId>) {
        for action in actions {
            self.execute_one(action, agent, model).await;
        }
    }

    async fn execute_one(&self, action: ActionRecord, agent: &str, model: Option<&ModelId>) {
        match action {
            ActionRecord::Send {
                session_id,
                message,
                synthetic,
            } => {
                let Some(model) = model else {
                    tracing::warn!(%session_id, "dropping send action: no known model yet");
                    return;
                };
                let result = if synthetic {
                    self.host
                        .session_prompt_async(&session_id, agent, model, &message)
                        .await
                } else {
                    self.host.session_prompt(&session_id, agent, model, &message).await
                };
                if let Err(error) = result {
                    tracing::warn!(%session_id, %error, "send action failed");
                }
            }
            ActionRecord::CreateSession { title } => {
                if let Err(error) = self.host.session_create(&title).await {
                    tracing::warn!(%title, %error, "create_session action failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opencode_evolve_core::host::SessionSummary;
    use opencode_evolve_core::SessionId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeHost {
        prompts: Mutex<Vec<(String, bool)>>,
        created: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HostSdk for FakeHost {
        async fn session_create(&self, title: &str) -> anyhow::Result<SessionId> {
            self.created.lock().unwrap().push(title.to_string());
            Ok(SessionId::new("new"))
        }

        async fn session_list(&self) -> anyhow::Result<Vec<SessionSummary>> {
            Ok(Vec::new())
        }

        async fn session_prompt(
            &self,
            _session_id: &SessionId,
            _agent: &str,
            _model: &ModelId,
            text: &str,
        ) -> anyhow::Result<()> {
            self.prompts.lock().unwrap().push((text.to_string(), false));
            Ok(())
        }

        async fn session_prompt_async(
            &self,
            _session_id: &SessionId,
            _agent: &str,
            _model: &ModelId,
            text: &str,
        ) -> anyhow::Result<()> {
            self.prompts.lock().unwrap().push((text.to_string(), true));
            Ok(())
        }
    }

    #[tokio::test]
    async fn send_without_a_known_model_is_dropped() {
        let host = FakeHost::default();
        let executor = ActionExecutor::new(&host);
        executor
            .execute_all(
                vec![ActionRecord::Send {
                    session_id: SessionId::new("s"),
                    message: "hi".to_string(),
                    synthetic: true,
                }],
                "evolve",
                None,
            )
            .await;
        assert!(host.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_and_create_session_both_dispatch() {
        let host = FakeHost::default();
        let executor = ActionExecutor::new(&host);
        let model = ModelId::new("anthropic", "claude");
        executor
            .execute_all(
                vec![
                    ActionRecord::Send {
                        session_id: SessionId::new("s"),
                        message: "hi".to_string(),
                        synthetic: true,
                    },
                    ActionRecord::CreateSession {
                        title: "t".to_string(),
                    },
                ],
                "evolve",
                Some(&model),
            )
            .await;
        assert_eq!(host.prompts.lock().unwrap().len(), 1);
        assert_eq!(host.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn a_failing_action_does_not_stop_the_rest() {
        struct FailingThenFakeHost(FakeHost);
        #[async_trait]
        impl HostSdk for FailingThenFakeHost {
            async fn session_create(&self, title: &str) -> anyhow::Result<SessionId> {
                self.0.session_create(title).await
            }
            async fn session_list(&self) -> anyhow::Result<Vec<SessionSummary>> {
                self.0.session_list().await
            }
            async fn session_prompt(
                &self,
                _session_id: &SessionId,
                _agent: &str,
                _model: &ModelId,
                _text: &str,
            ) -> anyhow::Result<()> {
                anyhow::bail!("boom")
            }
            async fn session_prompt_async(
                &self,
                session_id: &SessionId,
                agent: &str,
                model: &ModelId,
                text: &str,
            ) -> anyhow::Result<()> {
                self.0.session_prompt_async(session_id, agent, model, text).await
            }
        }

        let host = FailingThenFakeHost(FakeHost::default());
        let executor = ActionExecutor::new(&host);
        let model = ModelId::new("anthropic", "claude");
        executor
            .execute_all(
                vec![
                    ActionRecord::Send {
                        session_id: SessionId::new("s"),
                        message: "blocking".to_string(),
                        synthetic: false,
                    },
                    ActionRecord::CreateSession {
                        title: "t".to_string(),
                    },
                ],
                "evolve",
                Some(&model),
            )
            .await;
        assert_eq!(host.0.created.lock().unwrap().len(), 1);
    }
}
