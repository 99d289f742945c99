//! Core protocol types for authlink's wire format.
//!
//! Every type in this module travels "on the wire": it is serialized by a
//! [`Codec`](crate::Codec), framed by the transport, and decoded on the
//! other side. The catalog is closed: a peer that receives an unknown
//! `type` tag fails to decode instead of guessing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

/// Version stamped on every [`Envelope`]. There is no negotiation: a peer
/// speaking another version is rejected.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// SessionToken
// ---------------------------------------------------------------------------

/// An opaque 128-bit session token issued by the authentication service.
///
/// The client never interprets the bits; it hands the token back verbatim
/// when asking the service to refresh it. `#[serde(transparent)]` puts the
/// token on the wire as its hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Generates a fresh random token (UUID v4).
    ///
    /// Issuing tokens is the service's job; this exists for service
    /// implementations and test doubles.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ProtocolError::InvalidMessage(format!("bad session token: {e}")))
    }
}

// ---------------------------------------------------------------------------
// WireSecret
// ---------------------------------------------------------------------------

/// The secret field of a login request: plaintext or a hex digest,
/// depending on how the client was configured.
///
/// Serialized as a bare string; `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireSecret(String);

impl WireSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret exactly as it goes on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WireSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WireSecret([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// Reason codes and answer results
// ---------------------------------------------------------------------------

/// Machine-readable reason attached to an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The service did not accept the username/secret pair.
    BadUsernameOrPassword,
    /// The credentials are valid, but the principal is not registered as
    /// a server.
    NotARecognizedServer,
    /// A server-only operation was attempted without a server login.
    NotAuthorizedAsServer,
}

impl ErrorCode {
    /// The stable string form used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadUsernameOrPassword => "BAD_USERNAME_OR_PASSWORD",
            Self::NotARecognizedServer => "NOT_A_RECOGNIZED_SERVER",
            Self::NotAuthorizedAsServer => "NOT_AUTHORIZED_AS_SERVER",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a server login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerLoginResult {
    Success,
    /// Username or secret rejected.
    BadCredentials,
    /// Credentials fine, but not a server principal.
    NotAServer,
}

impl ServerLoginResult {
    /// The reason code for a failed login, or `None` on success.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success => None,
            Self::BadCredentials => Some(ErrorCode::BadUsernameOrPassword),
            Self::NotAServer => Some(ErrorCode::NotARecognizedServer),
        }
    }
}

/// Outcome of a token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshResult {
    /// The token is valid and its lifetime was extended.
    Success,
    /// The service does not know this token.
    Invalid,
    /// The token existed but has expired.
    Expired,
}

// ---------------------------------------------------------------------------
// Message: the catalog
// ---------------------------------------------------------------------------

/// Every message exchanged with the authentication service.
///
/// Requests and answers come in fixed pairs; after sending a request the
/// client reads exactly one frame and expects its partner:
///
/// | request                 | answer                 |
/// |-------------------------|------------------------|
/// | `LoginRequest`          | `LoginAnswer`          |
/// | `ServerLoginRequest`    | `ServerLoginAnswer`    |
/// | `RefreshSessionRequest` | `RefreshSessionAnswer` |
/// | `EndOfCommunication`    | (none)                 |
///
/// `#[serde(tag = "type")]` produces internally tagged JSON such as
/// `{ "type": "LoginAnswer", "token": "…" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Client → Service: plain user login.
    LoginRequest { username: String, secret: WireSecret },

    /// Service → Client: `token` is `None` when the credentials were
    /// rejected.
    LoginAnswer { token: Option<SessionToken> },

    /// Client → Service: privileged login that keeps the channel open.
    ServerLoginRequest { username: String, secret: WireSecret },

    /// Service → Client: tri-state server login result.
    ServerLoginAnswer { result: ServerLoginResult },

    /// Client → Service: "is this token still good?"
    RefreshSessionRequest { token: SessionToken },

    /// Service → Client: refresh verdict.
    RefreshSessionAnswer { result: RefreshResult },

    /// Client → Service: graceful shutdown of a server channel. One-way.
    EndOfCommunication,
}

impl Message {
    /// The variant name, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoginRequest { .. } => "LoginRequest",
            Self::LoginAnswer { .. } => "LoginAnswer",
            Self::ServerLoginRequest { .. } => "ServerLoginRequest",
            Self::ServerLoginAnswer { .. } => "ServerLoginAnswer",
            Self::RefreshSessionRequest { .. } => "RefreshSessionRequest",
            Self::RefreshSessionAnswer { .. } => "RefreshSessionAnswer",
            Self::EndOfCommunication => "EndOfCommunication",
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level wrapper: every frame on the wire is one `Envelope`.
///
/// ```text
/// { "version": 1, "message": { "type": "LoginRequest", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version the sender speaks.
    pub version: u32,

    /// The message itself.
    pub message: Message,
}

impl Envelope {
    /// Wraps a message, stamping the current [`PROTOCOL_VERSION`].
    pub fn new(message: Message) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message,
        }
    }

    /// Unwraps the message after checking the version.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnsupportedVersion`] if the sender speaks
    /// a different version.
    pub fn into_message(self) -> Result<Message, ProtocolError> {
        if self.version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion {
                expected: PROTOCOL_VERSION,
                found: self.version,
            });
        }
        Ok(self.message)
    }
}

// =========================================================================
// Tests
// =========================================================================
