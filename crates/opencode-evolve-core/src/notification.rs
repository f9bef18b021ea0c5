use serde::{Deserialize, Serialize};

/// An opaque notification object. The hook decides its schema; the plugin
/// only ever routes and formats it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification(pub serde_json::Value);

impl Notification {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }
}
