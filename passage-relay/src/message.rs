//! Control-channel message types.
//!
//! These are the JSON text frames the relay writes to a bridge's
//! control channel. The bridge never sends structured messages back;
//! its inbound control frames are fanned out to status observers
//! verbatim.

use serde::{Deserialize, Serialize};

/// Server-to-bridge control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlMessage {
    /// A remote controller connected; the bridge should dial back a
    /// data channel carrying this connection id in the URL path.
    Connect {
        /// Connect payload
        data: ConnectData,
    },
    /// At least one status observer is now subscribed
    StartStatus,
    /// The last status observer unsubscribed
    StopStatus,
}

/// Payload of a [`ControlMessage::Connect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectData {
    /// Server-assigned session id
    pub connection_id: String,
}

impl ControlMessage {
    /// Builds a connect message for a fresh session.
    #[must_use]
    pub fn connect(connection_id: String) -> Self {
        Self::Connect {
            data: ConnectData { connection_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_wire_format() {
        let msg = ControlMessage::connect("abc".to_string());
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"connect","data":{"connectionId":"abc"}}"#);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ControlMessage::StartStatus).unwrap(),
            r#"{"type":"startStatus"}"#
        );
        assert_eq!(
            serde_json::to_string(&ControlMessage::StopStatus).unwrap(),
            r#"{"type":"stopStatus"}"#
        );
    }

    #[test]
    fn test_connect_round_trip() {
        let json = r#"{"type":"connect","data":{"connectionId":"7f3a"}}"#;
        let msg: ControlMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ControlMessage::connect("7f3a".to_string()));
    }
}
