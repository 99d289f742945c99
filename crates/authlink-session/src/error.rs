//! Error types for the session layer.

use authlink_protocol::{ErrorCode, ProtocolError};
use authlink_transport::TransportError;

/// Errors that can occur while logging in, refreshing, or closing.
///
/// Callers usually branch on [`SessionError::kind`] rather than on the
/// individual variants: re-prompt for credentials on
/// `AuthenticationFailed`, retry later on `TransportFailure`, and treat
/// `ProtocolError` as a service/client mismatch.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The service answered, and the answer was "no".
    #[error("authentication failed: {0}")]
    AuthenticationFailed(ErrorCode),

    /// `refresh_token` was called without a live server login.
    #[error("not logged in as a server; call connect_as_server first")]
    NotAuthorizedAsServer,

    /// Opening, reading from, or closing the channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every write attempt for one message failed.
    #[error("message not delivered after {attempts} attempts: {source}")]
    DeliveryFailed {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The answer could not be decoded, or was not the expected variant.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Coarse classification of a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    AuthenticationFailed,
    NotAuthorizedAsServer,
    TransportFailure,
    ProtocolError,
}

impl SessionError {
    /// Classifies this error for caller-side branching.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::AuthenticationFailed(_) => FailureKind::AuthenticationFailed,
            Self::NotAuthorizedAsServer => FailureKind::NotAuthorizedAsServer,
            Self::Transport(_) | Self::DeliveryFailed { .. } => {
                FailureKind::TransportFailure
            }
            Self::Protocol(_) => FailureKind::ProtocolError,
        }
    }

    /// The reason code carried by this error, if any.
    pub fn reason(&self) -> Option<ErrorCode> {
        match self {
            Self::AuthenticationFailed(code) => Some(*code),
            Self::NotAuthorizedAsServer => Some(ErrorCode::NotAuthorizedAsServer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_transport_and_delivery_failures() {
        let closed = SessionError::Transport(TransportError::ConnectionClosed(
            "gone".into(),
        ));
        let undelivered = SessionError::DeliveryFailed {
            attempts: 5,
            source: TransportError::TimedOut { operation: "send" },
        };
        assert_eq!(closed.kind(), FailureKind::TransportFailure);
        assert_eq!(undelivered.kind(), FailureKind::TransportFailure);
        assert!(undelivered.to_string().contains("5 attempts"));
    }

    #[test]
    fn test_reason_reports_code_for_auth_failures() {
        let err = SessionError::AuthenticationFailed(ErrorCode::NotARecognizedServer);
        assert_eq!(err.kind(), FailureKind::AuthenticationFailed);
        assert_eq!(err.reason(), Some(ErrorCode::NotARecognizedServer));
        assert!(err.to_string().contains("NOT_A_RECOGNIZED_SERVER"));

        assert_eq!(
            SessionError::NotAuthorizedAsServer.reason(),
            Some(ErrorCode::NotAuthorizedAsServer)
        );
    }

    #[test]
    fn test_reason_is_none_for_protocol_errors() {
        let err: SessionError =
            ProtocolError::InvalidMessage("bad".into()).into();
        assert_eq!(err.kind(), FailureKind::ProtocolError);
        assert_eq!(err.reason(), None);
    }
}
