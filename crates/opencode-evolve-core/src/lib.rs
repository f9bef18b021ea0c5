//! Shared data model for the opencode-evolve plugin engine.
//!
//! This crate has no process-spawning or I/O logic of its own — it is the
//! vocabulary every other `opencode-evolve-*` crate shares, plus the
//! [`HostSdk`] trait that stands in for the out-of-scope chat host.

pub mod action;
pub mod config;
pub mod hook;
pub mod host;
pub mod model;
pub mod notification;
pub mod runtime_state;
pub mod session;

pub use action::ActionRecord;
pub use config::WorkspaceConfig;
pub use hook::{HookInvocation, HookName, OBSERVATIONAL_HOOKS};
pub use host::HostSdk;
pub use model::ModelId;
pub use notification::Notification;
pub use runtime_state::RuntimeState;
pub use session::SessionId;

/// The sentinel substring in an inbound system array that signals the
/// plugin should take ownership of a prompt cycle.
pub const AGENT_MARKER: &str = "<~ PERSONA AGENT MARKER ~>";
