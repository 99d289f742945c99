//! Unified error type for the authlink client.

use authlink_protocol::ProtocolError;
use authlink_session::{FailureKind, SessionError};
use authlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `authlink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum AuthlinkError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unexpected answer).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (login rejected, not a server, delivery).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client was configured with missing or invalid values.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AuthlinkError {
    /// The [`FailureKind`] of a wrapped error, or `None` for
    /// configuration errors, which never reach the service.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Transport(_) => Some(FailureKind::TransportFailure),
            Self::Protocol(_) => Some(FailureKind::ProtocolError),
            Self::Session(e) => Some(e.kind()),
            Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use authlink_protocol::ErrorCode;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let authlink_err: AuthlinkError = err.into();
        assert!(matches!(authlink_err, AuthlinkError::Transport(_)));
        assert!(authlink_err.to_string().contains("gone"));
        assert_eq!(authlink_err.kind(), Some(FailureKind::TransportFailure));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let authlink_err: AuthlinkError = err.into();
        assert!(matches!(authlink_err, AuthlinkError::Protocol(_)));
        assert_eq!(authlink_err.kind(), Some(FailureKind::ProtocolError));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AuthenticationFailed(ErrorCode::BadUsernameOrPassword);
        let authlink_err: AuthlinkError = err.into();
        assert!(matches!(authlink_err, AuthlinkError::Session(_)));
        assert_eq!(authlink_err.kind(), Some(FailureKind::AuthenticationFailed));
    }

    #[test]
    fn test_config_error_has_no_kind() {
        let err = AuthlinkError::Config("port must not be 0".into());
        assert_eq!(err.kind(), None);
        assert!(err.to_string().contains("port must not be 0"));
    }
}
