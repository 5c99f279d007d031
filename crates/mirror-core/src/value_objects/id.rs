//! Typed entity identifiers
//!
//! The remote service assigns opaque string IDs; each entity kind gets its
//! own newtype so that a `UserId` can never be passed where a `ChannelId`
//! is expected. `MemberId` is the composite server-scoped key rendered as
//! `"<server>.<user>"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// View the identifier as a string slice
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string
            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a user account
    UserId
);
string_id!(
    /// Identifier of a channel (any variant)
    ChannelId
);
string_id!(
    /// Identifier of a server
    ServerId
);
string_id!(
    /// Identifier of a role, scoped to one server
    RoleId
);
string_id!(
    /// Identifier of a message
    MessageId
);
string_id!(
    /// Invite code (doubles as the invite's identity)
    InviteCode
);

/// Composite member key: a user's membership in one server
///
/// Wire form is an object `{"server": ..., "user": ...}`; the canonical
/// string form used as cache key is `"<server>.<user>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId {
    pub server: ServerId,
    pub user: UserId,
}

impl MemberId {
    /// Create a member key from its parts
    pub fn new(server: impl Into<ServerId>, user: impl Into<UserId>) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
        }
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.server, self.user)
    }
}

/// Error parsing a `"<server>.<user>"` member key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid member ID: {0:?}")]
pub struct MemberIdParseError(pub String);

impl FromStr for MemberId {
    type Err = MemberIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((server, user)) if !server.is_empty() && !user.is_empty() => {
                Ok(Self::new(server, user))
            }
            _ => Err(MemberIdParseError(s.to_owned())),
        }
    }
}
