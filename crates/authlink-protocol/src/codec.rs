//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The session layer doesn't care HOW an [`Envelope`](crate::Envelope) is
//! turned into bytes, only that something implements [`Codec`]. Today that
//! is [`JsonCodec`]; a compact binary codec can be added without touching
//! the session code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `decode` is bounded on `DeserializeOwned` so the decoded value owns its
/// data and the receive buffer can be dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON keeps the wire format readable from any language, which matters
/// because the authentication service is not necessarily written in Rust.
///
/// ## Example
///
/// ```rust
/// use authlink_protocol::{Codec, Envelope, JsonCodec, Message};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::new(Message::EndOfCommunication);
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Envelope, Message, SessionToken};

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<Envelope, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encodes_envelope_as_utf8_json() {
        let token = SessionToken::generate();
        let bytes = JsonCodec
            .encode(&Envelope::new(Message::RefreshSessionRequest { token }))
            .unwrap();
        let text = std::str::from_utf8(&bytes).expect("json is utf-8");
        assert!(text.contains("RefreshSessionRequest"));
        assert!(text.contains(&token.to_string()));
    }
}
