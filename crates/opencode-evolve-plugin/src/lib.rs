//! Host callback glue (spec.md §2 component 10): binds the host's
//! lifecycle callbacks to the hook caller, session state store, tool
//! registry, action executor, and heartbeat scheduler built by the other
//! `opencode-evolve-*` crates.

pub mod engine;
pub mod heartbeat_glue;
pub mod observe;
pub mod tools;
pub mod transform;

pub use engine::Engine;
pub use observe::ObservedTurn;
