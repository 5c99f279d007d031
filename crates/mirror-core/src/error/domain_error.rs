//! Domain errors - shape violations in decoded entity data

use thiserror::Error;

use crate::value_objects::RoleId;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Role {0} constructed without a name")]
    RoleMissingName(RoleId),

    #[error("Invalid member ID: {0}")]
    InvalidMemberId(String),

    #[error("Malformed entity payload: {0}")]
    MalformedEntity(String),
}

impl DomainError {
    /// Get an error code string for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoleMissingName(_) => "ROLE_MISSING_NAME",
            Self::InvalidMemberId(_) => "INVALID_MEMBER_ID",
            Self::MalformedEntity(_) => "MALFORMED_ENTITY",
        }
    }
}

impl From<crate::value_objects::MemberIdParseError> for DomainError {
    fn from(err: crate::value_objects::MemberIdParseError) -> Self {
        Self::InvalidMemberId(err.0)
    }
}
