//! Gateway error types
//!
//! Protocol errors are always terminal: they abort the receive loop and
//! end the session. There is no automatic retry anywhere in this engine.

use thiserror::Error;

use mirror_core::{DomainError, FetchError};

use crate::protocol::ErrorCode;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors reported by the remote service or raised while decoding frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Remote error: unlabeled failure")]
    LabelMe,

    #[error("Remote error: internal gateway failure")]
    InternalError,

    #[error("Remote error: the session is invalid")]
    InvalidSession,

    #[error("Remote error: onboarding is not finished")]
    OnboardingNotFinished,

    #[error("Remote error: the session is already authenticated")]
    AlreadyAuthenticated,

    #[error("Remote error: unrecognized error code")]
    Unknown,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
}

impl From<ErrorCode> for ProtocolError {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::LabelMe => Self::LabelMe,
            ErrorCode::InternalError => Self::InternalError,
            ErrorCode::InvalidSession => Self::InvalidSession,
            ErrorCode::OnboardingNotFinished => Self::OnboardingNotFinished,
            ErrorCode::AlreadyAuthenticated => Self::AlreadyAuthenticated,
            ErrorCode::Unknown => Self::Unknown,
        }
    }
}

/// Gateway session errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The transport was used while the link is not open
    #[error("Connection closed")]
    ConnectionClosed,

    /// Opening the persistent connection failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The keep-alive hand-off exceeded its bounded wait
    #[error("Keep-alive stalled: outbound hand-off timed out")]
    KeepAliveStalled,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Request(#[from] FetchError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping_is_total() {
        let codes = [
            ErrorCode::LabelMe,
            ErrorCode::InternalError,
            ErrorCode::InvalidSession,
            ErrorCode::OnboardingNotFinished,
            ErrorCode::AlreadyAuthenticated,
            ErrorCode::Unknown,
        ];
        for code in codes {
            // every remote code maps to a protocol error, never a panic
            let _: ProtocolError = code.into();
        }
    }

    #[test]
    fn test_fetch_error_wraps_transparently() {
        let err: GatewayError = FetchError::NotFound.into();
        assert!(matches!(err, GatewayError::Request(FetchError::NotFound)));
    }
}
