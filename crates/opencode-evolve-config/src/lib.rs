//! Config loader: reads an optional config document from the workspace and
//! merges it over [`WorkspaceConfig::default()`].
//!
//! JSONC comment-stripping itself is out of scope (spec.md §1 names it an
//! external collaborator) — this crate leans on the `jsonc-parser` crate
//! the same way the teacher's config loader does, rather than
//! reimplementing comment stripping.

use opencode_evolve_core::WorkspaceConfig;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Partial config document: every field optional, so an absent key leaves
/// the corresponding default untouched.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct PartialConfig {
    hook: Option<String>,
    heartbeat_ms: Option<u64>,
    hook_timeout: Option<u64>,
    heartbeat_title: Option<String>,
    heartbeat_agent: Option<String>,
    prefix: Option<String>,
    test_script: Option<String>,
    debug_log_path: Option<String>,
}

impl PartialConfig {
    fn merge_into(self, config: &mut WorkspaceConfig) {
        if let Some(v) = self.hook {
            config.hook = v;
        }
        if let Some(v) = self.heartbeat_ms {
            config.heartbeat_ms = v;
        }
        if let Some(v) = self.hook_timeout {
            config.hook_timeout = v;
        }
        if let Some(v) = self.heartbeat_title {
            config.heartbeat_title = v;
        }
        if let Some(v) = self.heartbeat_agent {
            config.heartbeat_agent = v;
        }
        if let Some(v) = self.prefix {
            config.prefix = v;
        }
        if let Some(v) = self.test_script {
            config.test_script = Some(v);
        }
        if let Some(v) = self.debug_log_path {
            config.debug_log_path = Some(std::path::PathBuf::from(v));
        }
    }
}

/// Parse a JSONC document's text into a [`WorkspaceConfig`] merged over the
/// defaults. Used by both [`load`] and tests.
pub fn merge_from_str(content: &str) -> anyhow::Result<WorkspaceConfig> {
    let parse_options = jsonc_parser::ParseOptions {
        allow_trailing_commas: true,
        ..Default::default()
    };
    let partial: PartialConfig = jsonc_parser::parse_to_serde_value(content, &parse_options)?
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_default();
    let mut config = WorkspaceConfig::default();
    partial.merge_into(&mut config);
    Ok(config)
}

/// Resolve the well-known config path under a workspace root.
pub fn config_path(workspace: &Path) -> std::path::PathBuf {
    workspace.join("config").join("evolve.jsonc")
}

/// Read `<workspace>/config/evolve.jsonc` if present and merge it over
/// defaults. A missing config file is not an error — it just yields the
/// defaults.
pub fn load(workspace: &Path) -> Result<WorkspaceConfig, ConfigError> {
    let path = config_path(workspace);
    if !path.exists() {
        return Ok(WorkspaceConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    merge_from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
