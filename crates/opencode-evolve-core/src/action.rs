use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Side-effect request returned by a hook that the plugin executes against
/// the host SDK.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionRecord {
    Send {
        session_id: SessionId,
        message: String,
        #[serde(default = "default_synthetic")]
        synthetic: bool,
    },
    CreateSession {
        title: String,
    },
}

fn default_synthetic() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_action_defaults_synthetic_true() {
        let json = serde_json::json!({
            "type": "send",
            "session_id": "abc",
            "message": "hi"
        });
        let action: ActionRecord = serde_json::from_value(json).unwrap();
        match action {
            ActionRecord::Send { synthetic, .. } => assert!(synthetic),
            _ => panic!("expected Send"),
        }
    }
}
