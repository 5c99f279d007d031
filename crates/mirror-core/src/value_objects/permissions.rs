//! Permission bitflags carried by roles, servers, and channels
//!
//! The remote service transmits permission masks as plain integers; the
//! flag vocabulary below covers the channel and server scopes.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Permission flags for a server, channel, or role
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        /// Manage the channel (edit, delete)
        const MANAGE_CHANNEL      = 1 << 0;
        /// Manage server settings
        const MANAGE_SERVER       = 1 << 1;
        /// Manage permission assignments
        const MANAGE_PERMISSIONS  = 1 << 2;
        /// Create, edit, delete roles
        const MANAGE_ROLE         = 1 << 3;
        /// Kick members from the server
        const KICK_MEMBERS        = 1 << 6;
        /// Ban members from the server
        const BAN_MEMBERS         = 1 << 7;
        /// Change own nickname
        const CHANGE_NICKNAME     = 1 << 10;
        /// Change other members' nicknames
        const MANAGE_NICKNAMES    = 1 << 11;
        /// View the channel and its history
        const VIEW_CHANNEL        = 1 << 20;
        /// Read message history
        const READ_MESSAGE_HISTORY = 1 << 21;
        /// Send messages
        const SEND_MESSAGE        = 1 << 22;
        /// Delete other users' messages
        const MANAGE_MESSAGES     = 1 << 23;
        /// Create invites
        const INVITE_OTHERS       = 1 << 25;
        /// Connect to voice channels
        const CONNECT             = 1 << 30;
        /// Speak in voice channels
        const SPEAK               = 1 << 31;

        /// Baseline permissions granted to everyone
        const DEFAULT = Self::VIEW_CHANNEL.bits()
            | Self::READ_MESSAGE_HISTORY.bits()
            | Self::SEND_MESSAGE.bits()
            | Self::INVITE_OTHERS.bits()
            | Self::CONNECT.bits()
            | Self::SPEAK.bits();
    }
}

impl Permissions {
    /// Check whether this set grants a required permission
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        self.contains(permission)
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Get the raw bits
    #[inline]
    pub fn to_u64(self) -> u64 {
        self.bits()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// Serialize as a bare integer, matching the wire format
impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

// Deserialize from an integer or a numeric string
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer or numeric string of permission bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value as u64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Permissions::from_bits_truncate)
                    .map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<u64> for Permissions {
    fn from(bits: u64) -> Self {
        Permissions::from_bits_truncate(bits)
    }
}

impl From<Permissions> for u64 {
    fn from(permissions: Permissions) -> Self {
        permissions.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_roles() {
        let combined = Permissions::combine([
            Permissions::SEND_MESSAGE,
            Permissions::MANAGE_MESSAGES,
            Permissions::empty(),
        ]);
        assert!(combined.has(Permissions::SEND_MESSAGE));
        assert!(combined.has(Permissions::MANAGE_MESSAGES));
        assert!(!combined.has(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_serde_integer() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGE;
        let json = serde_json::to_string(&perms).unwrap();
        let back: Permissions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, perms);
    }

    #[test]
    fn test_deserialize_numeric_string() {
        let perms: Permissions = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(perms, Permissions::MANAGE_CHANNEL);
    }

    #[test]
    fn test_unknown_bits_truncated() {
        let perms: Permissions = serde_json::from_str(&u64::MAX.to_string()).unwrap();
        assert!(perms.has(Permissions::VIEW_CHANNEL));
    }
}
