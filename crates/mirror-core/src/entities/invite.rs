//! Invite entity - immutable after creation, deletable

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChannelId, InviteCode, ServerId};

/// Discriminant of an invite variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InviteType {
    Server,
    Group,
}

/// Invite entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Invite {
    /// Invite into a server channel
    Server {
        code: InviteCode,
        server_id: ServerId,
        server_name: String,
        channel_id: ChannelId,
        channel_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel_description: Option<String>,
        user_name: String,
        member_count: i64,
    },
    /// Invite into a group channel
    Group {
        code: InviteCode,
        channel_id: ChannelId,
        channel_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel_description: Option<String>,
        user_name: String,
    },
}

impl Invite {
    /// Get the invite code
    pub fn code(&self) -> &InviteCode {
        match self {
            Self::Server { code, .. } | Self::Group { code, .. } => code,
        }
    }

    /// Get the channel the invite points into
    pub fn channel_id(&self) -> &ChannelId {
        match self {
            Self::Server { channel_id, .. } | Self::Group { channel_id, .. } => channel_id,
        }
    }

    /// Get the variant discriminant
    pub fn invite_type(&self) -> InviteType {
        match self {
            Self::Server { .. } => InviteType::Server,
            Self::Group { .. } => InviteType::Group,
        }
    }
}
