//! Protocol error types.

use thiserror::Error;

/// Result alias for wire-level operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or validating wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// An identity token was empty or whitespace only.
    #[error("identity must not be empty")]
    EmptyIdentity,

    /// A named push event carried a payload that is not the expected JSON.
    #[error("invalid payload for event `{event}`: {reason}")]
    InvalidPayload {
        /// Event name the payload arrived under.
        event: String,
        /// Decoder message.
        reason: String,
    },

    /// A websocket frame was not a valid Engine.IO or Socket.IO packet.
    #[error("malformed push packet: {reason}")]
    MalformedPacket {
        /// What was wrong with it.
        reason: String,
    },
}
