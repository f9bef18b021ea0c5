//! Session state store, tool registry, built-in tools, single-occurrence
//! patch, and the action executor (spec.md §4.4, §4.5, §4.6, §4.7).

pub mod action;
pub mod builtins;
pub mod patch;
pub mod runtime_state;
pub mod state;
pub mod tool;

pub use action::ActionExecutor;
pub use builtins::{BuiltinOutcome, BuiltinTools};
pub use patch::{single_occurrence_patch, PatchError};
pub use runtime_state::RuntimeStateStore;
pub use state::SessionStore;
pub use tool::{ToolDefinition, ToolRegistry, BUILTIN_TOOL_NAMES};
