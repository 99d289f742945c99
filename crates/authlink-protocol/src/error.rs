//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the bytes arrived fine but could not
//! be turned into (or out of) the message the exchange called for.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, an unknown
    /// `type` tag, or a truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The envelope was stamped with a protocol version we do not speak.
    #[error("unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion { expected: u32, found: u32 },

    /// A well-formed message arrived, but not the answer the pending
    /// request calls for.
    #[error("expected {expected}, received {found}")]
    UnexpectedMessage {
        expected: &'static str,
        found: &'static str,
    },
}
