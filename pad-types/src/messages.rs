//! Protocol messages for livepad.
//!
//! Frames travel as JSON text inside an [`Envelope`]. The server and the
//! client speak slightly different vocabularies: inbound presence updates
//! carry the participant record, outbound ones carry only the local value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EditorChange, Envelope, MessageType, Operation, ParticipantId, Position, SessionId, WireError};

/// A participant as described by the server.
///
/// The local participant arrives as `{id, name, pos}`, remote ones as
/// `{uuid, name, pos}`; both decode into this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier
    #[serde(alias = "uuid")]
    pub id: ParticipantId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Last known cursor position (absent before the first cursor move)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Position>,
}

impl Participant {
    /// Create a participant record.
    pub fn new(id: impl Into<ParticipantId>, name: &str, pos: Option<Position>) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            pos,
        }
    }

    /// Cursor position, defaulting to the start of the document.
    pub fn position(&self) -> Position {
        self.pos.unwrap_or_default()
    }
}

/// Session snapshot sent by the server when a connection opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Init {
    /// Session joined (`"default"` for the implicit session)
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    /// Full document text
    pub text: String,
    /// The local participant
    pub me: Participant,
    /// Every other participant currently connected
    #[serde(default)]
    pub clients: Vec<Participant>,
}

/// Payload of a `change` message.
///
/// Carries the canonical [`Operation`] plus, for peers that want it, the
/// raw editor change it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeData {
    /// The range replacement to apply
    #[serde(flatten)]
    pub operation: Operation,
    /// Echo of the originating editor change
    #[serde(rename = "cmData", default, skip_serializing_if = "Option::is_none")]
    pub cm_data: Option<EditorChange>,
}

impl ChangeData {
    /// Wrap an operation with its originating editor change.
    pub fn new(operation: Operation, cm_data: Option<EditorChange>) -> Self {
        Self { operation, cm_data }
    }
}

/// A participant left the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveClient {
    /// The departed participant
    pub uuid: ParticipantId,
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Session snapshot
    Init(Init),
    /// A remote edit
    Change(ChangeData),
    /// A remote cursor moved
    CursorMove(Participant),
    /// A remote participant renamed
    NameChange(Participant),
    /// A remote participant left
    RemoveClient(RemoveClient),
    /// Liveness signal
    Ping,
}

impl ServerMessage {
    /// The envelope discriminator for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            ServerMessage::Init(_) => MessageType::Init,
            ServerMessage::Change(_) => MessageType::Change,
            ServerMessage::CursorMove(_) => MessageType::CursorMove,
            ServerMessage::NameChange(_) => MessageType::NameChange,
            ServerMessage::RemoveClient(_) => MessageType::RemoveClient,
            ServerMessage::Ping => MessageType::Ping,
        }
    }

    /// Decode a server frame.
    ///
    /// Unknown types yield [`WireError::InvalidMessageType`]; payloads that
    /// do not match their type yield [`WireError::Deserialization`].
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        let envelope = Envelope::from_json(text)?;
        let kind = envelope.message_type()?;
        let data = envelope.data;
        Ok(match kind {
            MessageType::Init => ServerMessage::Init(decode(data)?),
            MessageType::Change => ServerMessage::Change(decode(data)?),
            MessageType::CursorMove => ServerMessage::CursorMove(decode(data)?),
            MessageType::NameChange => ServerMessage::NameChange(decode(data)?),
            MessageType::RemoveClient => ServerMessage::RemoveClient(decode(data)?),
            MessageType::Ping => ServerMessage::Ping,
        })
    }

    /// Encode as a server frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        let data = match self {
            ServerMessage::Init(init) => encode(init)?,
            ServerMessage::Change(change) => encode(change)?,
            ServerMessage::CursorMove(p) | ServerMessage::NameChange(p) => encode(p)?,
            ServerMessage::RemoveClient(remove) => encode(remove)?,
            ServerMessage::Ping => Value::Null,
        };
        Envelope::new(self.message_type(), data).to_json()
    }
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// A local edit
    Change(ChangeData),
    /// The local cursor moved
    CursorMove(Position),
    /// The local display name changed
    NameChange(String),
}

impl ClientMessage {
    /// The envelope discriminator for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            ClientMessage::Change(_) => MessageType::Change,
            ClientMessage::CursorMove(_) => MessageType::CursorMove,
            ClientMessage::NameChange(_) => MessageType::NameChange,
        }
    }

    /// Encode as a client frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        let data = match self {
            ClientMessage::Change(change) => encode(change)?,
            ClientMessage::CursorMove(pos) => encode(pos)?,
            ClientMessage::NameChange(name) => Value::String(name.clone()),
        };
        Envelope::new(self.message_type(), data).to_json()
    }

    /// Decode a client frame.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        let envelope = Envelope::from_json(text)?;
        let kind = envelope.message_type()?;
        let data = envelope.data;
        match kind {
            MessageType::Change => Ok(ClientMessage::Change(decode(data)?)),
            MessageType::CursorMove => Ok(ClientMessage::CursorMove(decode(data)?)),
            MessageType::NameChange => Ok(ClientMessage::NameChange(decode(data)?)),
            other => Err(WireError::UnexpectedDirection {
                direction: "client",
                message_type: other.as_str().to_string(),
            }),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, WireError> {
    serde_json::from_value(data).map_err(WireError::Deserialization)
}

fn encode<T: Serialize>(value: &T) -> Result<Value, WireError> {
    serde_json::to_value(value).map_err(WireError::Serialization)
}
