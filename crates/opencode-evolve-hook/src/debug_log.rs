//! The "debug log" referenced throughout spec.md §4.1/§4.3/§7 — a thin
//! facade over `tracing` so call sites read like the spec's prose, with an
//! optional file mirror for hosts that want hook stderr/log lines captured
//! on disk instead of just the process's own stderr.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct DebugLog {
    mirror: Option<Mutex<std::fs::File>>,
}

impl DebugLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        let mirror = path.and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|error| {
                    tracing::warn!(?path, %error, "failed to open debug log mirror file");
                })
                .ok()
        });
        Self {
            mirror: mirror.map(Mutex::new),
        }
    }

    pub fn stderr_only() -> Self {
        Self { mirror: None }
    }

    /// Emit one line to the debug log: a hook's own `{"log": "..."}` line,
    /// forwarded stderr output, or an internal diagnostic.
    pub fn line(&self, source: &str, message: &str) {
        tracing::debug!(target: "opencode_evolve::debug", source, "{}", message);
        if let Some(file) = &self.mirror {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "[{source}] {message}");
            }
        }
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::stderr_only()
    }
}
