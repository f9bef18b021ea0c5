//! Tool registry (spec.md §4.6): hook-declared tool descriptors plus the
//! fixed built-in set, all named under the hook's stem so that replacing
//! the hook script renames every tool uniformly.

use serde::Deserialize;
use std::collections::HashMap;

/// A hook-declared tool descriptor, taken from `discover`'s `tools` field.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// The fixed built-in tool names, always present even if the hook is
/// broken (spec.md §4.6 rationale — the escape hatch).
pub const BUILTIN_TOOL_NAMES: &[&str] = &[
    "prompt_list",
    "prompt_read",
    "prompt_write",
    "prompt_patch",
    "hook_validate",
    "hook_read",
    "hook_write",
    "hook_patch",
];

/// Builds the full, stem-prefixed tool name list: hook-declared tools from
/// `discover`'s `tools` array, unioned with the built-ins.
pub struct ToolRegistry {
    stem: String,
    declared: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            declared: Vec::new(),
        }
    }

    /// Replaces the hook-declared tool set from a `discover` response's
    /// `tools` field (absent or malformed entries are skipped, never fatal).
    pub fn set_declared_from_discover(&mut self, discover_output: &serde_json::Value) {
        self.declared = discover_output
            .get("tools")
            .and_then(|value| value.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
    }

    pub fn prefixed_name(&self, bare_name: &str) -> String {
        format!("{}_{}", self.stem, bare_name)
    }

    /// All registered tool names, stem-prefixed: hook-declared first, then
    /// built-ins.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .declared
            .iter()
            .map(|tool| self.prefixed_name(&tool.name))
            .collect();
        names.extend(BUILTIN_TOOL_NAMES.iter().map(|name| self.prefixed_name(name)));
        names
    }

    pub fn declared_tools(&self) -> &[ToolDefinition] {
        &self.declared
    }

    /// Strips the stem prefix and a trailing underscore, returning the bare
    /// tool name, or `None` if `full_name` does not belong to this stem.
    pub fn bare_name<'a>(&self, full_name: &'a str) -> Option<&'a str> {
        full_name
            .strip_prefix(&self.stem)
            .and_then(|rest| rest.strip_prefix('_'))
    }

    pub fn is_builtin(bare_name: &str) -> bool {
        BUILTIN_TOOL_NAMES.contains(&bare_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_tools_are_prefixed_by_stem() {
        let mut registry = ToolRegistry::new("evolve");
        registry.set_declared_from_discover(&serde_json::json!({
            "tools": [{"name": "remember", "description": "store a fact", "parameters": {"fact": "the fact"}}]
        }));
        assert_eq!(registry.tool_names()[0], "evolve_remember");
    }

    #[test]
    fn builtins_are_always_present() {
        let registry = ToolRegistry::new("evolve");
        let names = registry.tool_names();
        assert!(names.contains(&"evolve_prompt_list".to_string()));
        assert!(names.contains(&"evolve_hook_write".to_string()));
    }

    #[test]
    fn bare_name_strips_stem_prefix() {
        let registry = ToolRegistry::new("evolve");
        assert_eq!(registry.bare_name("evolve_prompt_read"), Some("prompt_read"));
        assert_eq!(registry.bare_name("other_prompt_read"), None);
    }

    #[test]
    fn malformed_discover_tools_field_yields_no_declared_tools() {
        let mut registry = ToolRegistry::new("evolve");
        registry.set_declared_from_discover(&serde_json::json!({"tools": "not-an-array"}));
        assert!(registry.declared_tools().is_empty());
    }
}
