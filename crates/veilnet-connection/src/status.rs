//! Session status model

use serde::{Deserialize, Serialize};
use veilnet_session::SessionId;

/// Externally observable state of the connection manager.
///
/// Serialized as `{"status": "...", "sessionId": "..."}` with `sessionId`
/// present only while connected; this JSON is the source of truth for any
/// control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ConnectionStatus {
    NotConnected,
    Connecting,
    Connected {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    Reconnecting,
    Disconnecting,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::NotConnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connected_status_carries_session_id() {
        let status = ConnectionStatus::Connected {
            session_id: SessionId::new("session-100"),
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"status": "Connected", "sessionId": "session-100"})
        );
    }

    #[test]
    fn test_other_statuses_omit_session_id() {
        for (status, name) in [
            (ConnectionStatus::NotConnected, "NotConnected"),
            (ConnectionStatus::Connecting, "Connecting"),
            (ConnectionStatus::Reconnecting, "Reconnecting"),
            (ConnectionStatus::Disconnecting, "Disconnecting"),
        ] {
            assert_eq!(
                serde_json::to_value(&status).unwrap(),
                json!({"status": name})
            );
        }
    }

    #[test]
    fn test_status_json_round_trip() {
        let status = ConnectionStatus::Connected {
            session_id: SessionId::new("session-100"),
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: ConnectionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
