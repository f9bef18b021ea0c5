//! Lightweight in-process registry of live hook/sandbox subprocesses.
//!
//! Pure bookkeeping for a host that wants process-tree visibility (e.g. a
//! TUI sidebar); it has no effect on hook semantics and can go entirely
//! unread, grounded in the teacher's `rocode_core::process_registry`.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;

static REGISTRY: Lazy<ProcessRegistry> = Lazy::new(ProcessRegistry::default);

pub fn global() -> &'static ProcessRegistry {
    &REGISTRY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    Hook,
    Sandbox,
}

#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: u32,
    pub label: String,
    pub kind: ProcessKind,
}

#[derive(Default)]
pub struct ProcessRegistry {
    processes: RwLock<HashMap<u32, ProcessInfo>>,
}

impl ProcessRegistry {
    pub fn register(&self, pid: u32, label: impl Into<String>, kind: ProcessKind) {
        self.processes.write().insert(
            pid,
            ProcessInfo {
                pid,
                label: label.into(),
                kind,
            },
        );
    }

    pub fn unregister(&self, pid: u32) {
        self.processes.write().remove(&pid);
    }

    pub fn list(&self) -> Vec<ProcessInfo> {
        self.processes.read().values().cloned().collect()
    }
}
