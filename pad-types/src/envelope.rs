//! Envelope - the wire format wrapper for all livepad messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::WireError;

/// Message type discriminator carried in the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Session snapshot sent by the server on connect
    Init,
    /// A document edit
    Change,
    /// A participant's cursor moved
    CursorMove,
    /// A participant changed display name
    NameChange,
    /// A participant left
    RemoveClient,
    /// Liveness signal
    Ping,
}

impl MessageType {
    /// All message types, in protocol order.
    pub const ALL: [MessageType; 6] = [
        MessageType::Init,
        MessageType::Change,
        MessageType::CursorMove,
        MessageType::NameChange,
        MessageType::RemoveClient,
        MessageType::Ping,
    ];

    /// The discriminator string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Init => "init",
            MessageType::Change => "change",
            MessageType::CursorMove => "cursorMove",
            MessageType::NameChange => "nameChange",
            MessageType::RemoveClient => "removeClient",
            MessageType::Ping => "ping",
        }
    }
}

impl TryFrom<&str> for MessageType {
    type Error = WireError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| WireError::InvalidMessageType(value.to_string()))
    }
}

/// The envelope wraps every protocol message: `{"type": ..., "data": ...}`.
///
/// `data` is kept as raw JSON until the type has been inspected, so an
/// unknown type can be reported without failing to parse the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type discriminator
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Message payload (absent for `ping`)
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Create an envelope from a type and an already-encoded payload.
    pub fn new(msg_type: MessageType, data: Value) -> Self {
        Self {
            msg_type: msg_type.as_str().to_string(),
            data,
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Serialization)
    }

    /// Deserialize from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(WireError::Deserialization)
    }

    /// Get the message type as an enum.
    pub fn message_type(&self) -> Result<MessageType, WireError> {
        MessageType::try_from(self.msg_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_uses_type_and_data_keys() {
        let envelope = Envelope::new(MessageType::CursorMove, json!({"line": 1, "ch": 2}));
        let text = envelope.to_json().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "cursorMove");
        assert_eq!(value["data"]["line"], 1);
    }

    #[test]
    fn envelope_without_data_decodes_as_null() {
        let envelope = Envelope::from_json(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(envelope.message_type().unwrap(), MessageType::Ping);
        assert!(envelope.data.is_null());
    }

    #[test]
    fn message_type_names_match_wire() {
        for mt in MessageType::ALL {
            assert_eq!(MessageType::try_from(mt.as_str()).unwrap(), mt);
        }
    }

    #[test]
    fn invalid_message_type_fails() {
        assert!(MessageType::try_from("").is_err());
        assert!(MessageType::try_from("Init").is_err());
        assert!(MessageType::try_from("teleport").is_err());
    }

    #[test]
    fn malformed_frame_is_an_error() {
        assert!(matches!(
            Envelope::from_json("not json"),
            Err(WireError::Deserialization(_))
        ));
        assert!(Envelope::from_json(r#"{"data": {}}"#).is_err());
    }
}
