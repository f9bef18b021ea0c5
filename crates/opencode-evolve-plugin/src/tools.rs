//! Tool execution dispatch (spec.md §4.6): hook-declared tools commit after
//! `execute_tool`; built-ins run directly against the workspace.

use crate::engine::Engine;
use opencode_evolve_core::{HostSdk, SessionId};

impl<H: HostSdk> Engine<H> {
    /// `tool_before`/`tool_after`: observational, called for their
    /// side-effecting witness value only.
    pub async fn tool_before(&self, tool: &str, args: &serde_json::Value, session_id: &SessionId) {
        self.caller
            .call(
                "tool_before",
                serde_json::json!({ "tool": tool, "args": args, "session": { "id": session_id.as_str() } }),
                Some(session_id),
            )
            .await;
    }

    pub async fn tool_after(&self, tool: &str, args: &serde_json::Value, session_id: &SessionId) {
        self.caller
            .call(
                "tool_after",
                serde_json::json!({ "tool": tool, "args": args, "session": { "id": session_id.as_str() } }),
                Some(session_id),
            )
            .await;
    }

    /// Dispatches one stem-prefixed tool call, returning its textual result
    /// on success or its textual error on failure — tool-precondition
    /// failures never panic or bubble an exception (spec.md §7).
    pub async fn execute_tool(
        &self,
        full_tool_name: &str,
        args: serde_json::Value,
        session_id: &SessionId,
    ) -> Result<String, String> {
        let bare_name = {
            let tools = self.tools.lock().await;
            tools
                .bare_name(full_tool_name)
                .map(str::to_string)
                .ok_or_else(|| format!("unknown tool: {full_tool_name}"))?
        };

        if opencode_evolve_session::ToolRegistry::is_builtin(&bare_name) {
            return self.execute_builtin(&bare_name, args).await;
        }

        self.execute_declared(&bare_name, args, session_id).await
    }

    async fn execute_builtin(&self, bare_name: &str, args: serde_json::Value) -> Result<String, String> {
        match bare_name {
            "prompt_list" => self
                .builtins
                .prompt_list()
                .map(|names| serde_json::to_string(&names).unwrap_or_default()),
            "prompt_read" => {
                let name = required_str(&args, "path")?;
                self.builtins.prompt_read(name)
            }
            "prompt_write" => {
                let name = required_str(&args, "path")?;
                let content = required_str(&args, "content")?;
                self.builtins
                    .prompt_write(name, content)
                    .map(|outcome| outcome.result)
            }
            "prompt_patch" => {
                let name = required_str(&args, "path")?;
                let old = required_str(&args, "old_string")?;
                let new = required_str(&args, "new_string")?;
                self.builtins
                    .prompt_patch(name, old, new)
                    .map(|outcome| outcome.result)
            }
            "hook_validate" => {
                let content = required_str(&args, "content")?;
                let outcome = self.builtins.hook_validate(content).await;
                Ok(serde_json::json!({ "ok": outcome.ok, "output": outcome.output }).to_string())
            }
            "hook_read" => self.builtins.hook_read(),
            "hook_write" => {
                let content = required_str(&args, "content")?;
                self.builtins
                    .hook_write(content)
                    .await
                    .map(|outcome| outcome.result)
            }
            "hook_patch" => {
                let old = required_str(&args, "old_string")?;
                let new = required_str(&args, "new_string")?;
                self.builtins
                    .hook_patch(old, new)
                    .await
                    .map(|outcome| outcome.result)
            }
            other => Err(format!("unknown built-in tool: {other}")),
        }
    }

    async fn execute_declared(
        &self,
        bare_name: &str,
        args: serde_json::Value,
        session_id: &SessionId,
    ) -> Result<String, String> {
        let output = self
            .caller
            .call(
                "execute_tool",
                serde_json::json!({
                    "tool": bare_name,
                    "args": args,
                    "session": { "id": session_id.as_str() },
                }),
                Some(session_id),
            )
            .await;

        self.apply_side_effects(&output, session_id, &format!("update {bare_name}"))
            .await;

        let result = output
            .get("result")
            .and_then(|v| v.as_str())
            .unwrap_or("done")
            .to_string();
        Ok(result)
    }

    /// `session-compacting`: lets the hook observe (and optionally steer)
    /// a compaction cycle. Best-effort like every other hook call.
    pub async fn session_compacting(&self, session_id: &SessionId) -> serde_json::Value {
        self.caller
            .call(
                "compacting",
                serde_json::json!({ "session": { "id": session_id.as_str() } }),
                Some(session_id),
            )
            .await
    }
}

fn required_str<'a>(args: &'a serde_json::Value, field: &str) -> Result<&'a str, String> {
    args.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing required argument: {field}"))
}
