//! Resource-fetch errors
//!
//! Structured failures from the pull side of the protocol. Non-success
//! responses carry a `type` discriminator in the body; the fetcher
//! translates it into one of these variants rather than returning the raw
//! body.

use thiserror::Error;

/// Structured failure of a resource request
#[derive(Debug, Error)]
pub enum FetchError {
    /// The requested resource does not exist
    #[error("Resource not found")]
    NotFound,

    /// The token lacks permission for the operation
    #[error("Missing permission")]
    PermissionDenied,

    /// The request body or parameters failed remote validation
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A rate or size limit was exceeded
    #[error("Rate or size limit exceeded")]
    LimitExceeded,

    /// The request conflicts with current remote state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The remote service failed internally
    #[error("Remote internal error")]
    Internal,

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Translate a remote error-body discriminator into the taxonomy
    ///
    /// Discriminators outside the known vocabulary fall back on the HTTP
    /// status class.
    pub fn from_remote(discriminator: &str, status: u16) -> Self {
        match discriminator {
            "NotFound" | "UnknownUser" | "UnknownChannel" | "UnknownServer"
            | "UnknownMessage" => Self::NotFound,
            "MissingPermission" | "MissingUserPermission" | "NotPrivileged" | "Banned" => {
                Self::PermissionDenied
            }
            "FailedValidation" | "InvalidRole" | "InvalidOperation" | "InvalidCredentials" => {
                Self::ValidationFailed(discriminator.to_owned())
            }
            "TooManyServers" | "TooManyChannels" | "TooManyEmbeds" | "TooManyReplies"
            | "GroupTooLarge" | "PayloadTooLarge" | "TooManyRequests" => Self::LimitExceeded,
            "AlreadyInGroup" | "AlreadyInServer" | "AlreadyFriends" | "AlreadySentRequest"
            | "AlreadyOnboarded" => Self::Conflict(discriminator.to_owned()),
            "InternalError" | "DatabaseError" => Self::Internal,
            _ => match status {
                404 => Self::NotFound,
                403 => Self::PermissionDenied,
                400 | 422 => Self::ValidationFailed(discriminator.to_owned()),
                409 => Self::Conflict(discriminator.to_owned()),
                413 | 429 => Self::LimitExceeded,
                _ => Self::Internal,
            },
        }
    }

    /// Get an error code string for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal => "REMOTE_INTERNAL",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Check whether this is a not-found miss
    ///
    /// Delete and leave reconciliation paths degrade these to no-ops.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
