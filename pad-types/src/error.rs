//! Error types for the livepad wire format.

use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Unknown message type discriminator
    #[error("invalid message type: {0}")]
    InvalidMessageType(String),

    /// Message type is valid but not expected in this direction
    #[error("unexpected {direction} message type: {message_type}")]
    UnexpectedDirection {
        /// Which side the frame was decoded for ("server" or "client").
        direction: &'static str,
        /// The offending type discriminator.
        message_type: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WireError::InvalidMessageType("teleport".into());
        assert_eq!(err.to_string(), "invalid message type: teleport");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WireError>();
    }
}
