//! Hook IPC and the hook caller's recover cascade (spec.md §4.1, §4.2).

pub mod caller;
pub mod debug_log;
pub mod ipc;
pub mod registry;

pub use caller::{HistoryLookup, HookCaller};
pub use debug_log::DebugLog;
pub use ipc::{HookIpc, HookIpcError};
pub use registry::{ProcessInfo, ProcessKind, ProcessRegistry};
