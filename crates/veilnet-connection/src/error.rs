//! Connection manager errors

use thiserror::Error;
use veilnet_session::SessionError;

/// Errors surfaced by `connect` and `disconnect`.
///
/// This set is the whole contract: collaborator failures are folded onto the
/// step they broke (a directory outage reads as `NoProposals`, a promise
/// issuer or tunnel refusal as `ConnectionFailed`), with the underlying
/// cause logged. Nothing is retried inside the manager; every failure
/// bubbles up to the caller. Secondary errors raised while rolling back are
/// logged and suppressed in favor of the primary one.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("provider has no service proposals")]
    NoProposals,

    #[error("unsupported service type: {0}")]
    UnsupportedServiceType(String),

    #[error("dialog failed: {0}")]
    DialogFailed(String),

    #[error("session create failed: {0}")]
    SessionCreateFailed(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection was cancelled")]
    ConnectionCancelled,

    #[error("connection already exists")]
    AlreadyExists,

    #[error("no connection exists")]
    NoConnection,
}

impl From<SessionError> for ConnectionError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingContact => Self::DialogFailed(err.to_string()),
            SessionError::Dialog(cause) => Self::DialogFailed(cause.to_string()),
            SessionError::Create(message) => Self::SessionCreateFailed(message),
        }
    }
}
