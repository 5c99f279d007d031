//! Frame definitions
//!
//! Inbound frames decode exhaustively into [`ServerFrame`]; a tag outside
//! the vocabulary is a decode error, never a silently dropped frame.

use serde::{Deserialize, Serialize};

use mirror_core::{
    Channel, ChannelField, ChannelId, ChannelPatch, MemberData, MemberField, MemberId, MemberPatch,
    Message, MessageId, MessagePatch, Relationship, RoleField, RoleId, RolePatch, Server,
    ServerField, ServerId, ServerPatch, User, UserField, UserId, UserPatch,
};

use crate::events::EventKind;

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Handshake: authenticate the session with a token
    Authenticate { token: String },
    /// Liveness signal; the service echoes `data` back in a Pong
    Ping { data: i64 },
    /// Show a typing indicator in a channel
    BeginTyping { channel: ChannelId },
    /// Withdraw the typing indicator
    EndTyping { channel: ChannelId },
}

/// Error codes carried by a remote `Error` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ErrorCode {
    LabelMe,
    InternalError,
    InvalidSession,
    OnboardingNotFinished,
    AlreadyAuthenticated,
    #[serde(other)]
    Unknown,
}

/// Frames received from the service
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// Terminal error report; always aborts the receive loop
    Error { error: ErrorCode },
    /// Handshake acknowledgement
    Authenticated,
    /// Keep-alive echo
    Pong { data: i64 },
    /// Envelope carrying an ordered list of other frames
    Bulk { v: Vec<ServerFrame> },
    /// Initial bulk snapshot of all visible state
    Ready {
        users: Vec<User>,
        channels: Vec<Channel>,
        servers: Vec<Server>,
        members: Vec<MemberData>,
    },
    /// New message, fields flattened into the frame
    Message(Message),
    MessageUpdate {
        id: MessageId,
        channel: ChannelId,
        data: MessagePatch,
    },
    MessageDelete {
        id: MessageId,
        channel: ChannelId,
    },
    /// New channel, fields flattened into the frame
    ChannelCreate(Channel),
    ChannelUpdate {
        id: ChannelId,
        data: ChannelPatch,
        #[serde(default)]
        clear: Vec<ChannelField>,
    },
    ChannelDelete {
        id: ChannelId,
    },
    ChannelGroupJoin {
        id: ChannelId,
        user: UserId,
    },
    ChannelGroupLeave {
        id: ChannelId,
        user: UserId,
    },
    ChannelStartTyping {
        id: ChannelId,
        user: UserId,
    },
    ChannelStopTyping {
        id: ChannelId,
        user: UserId,
    },
    ChannelAck {
        id: ChannelId,
        user: UserId,
        message_id: MessageId,
    },
    /// New server, fields flattened into the frame
    ServerCreate(Server),
    ServerUpdate {
        id: ServerId,
        data: ServerPatch,
        #[serde(default)]
        clear: Vec<ServerField>,
    },
    ServerDelete {
        id: ServerId,
    },
    ServerMemberJoin {
        id: ServerId,
        user: UserId,
    },
    ServerMemberLeave {
        id: ServerId,
        user: UserId,
    },
    ServerMemberUpdate {
        id: MemberId,
        data: MemberPatch,
        #[serde(default)]
        clear: Vec<MemberField>,
    },
    ServerRoleUpdate {
        id: ServerId,
        role_id: RoleId,
        data: RolePatch,
        #[serde(default)]
        clear: Vec<RoleField>,
    },
    ServerRoleDelete {
        id: ServerId,
        role_id: RoleId,
    },
    UserUpdate {
        id: UserId,
        data: UserPatch,
        #[serde(default)]
        clear: Vec<UserField>,
    },
    UserRelationship {
        user: UserId,
        status: Relationship,
    },
}

impl ServerFrame {
    /// Get the event kind tag of this frame
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Error { .. } => EventKind::Error,
            Self::Authenticated => EventKind::Authenticated,
            Self::Pong { .. } => EventKind::Pong,
            Self::Bulk { .. } => EventKind::Bulk,
            Self::Ready { .. } => EventKind::Ready,
            Self::Message(_) => EventKind::Message,
            Self::MessageUpdate { .. } => EventKind::MessageUpdate,
            Self::MessageDelete { .. } => EventKind::MessageDelete,
            Self::ChannelCreate(_) => EventKind::ChannelCreate,
            Self::ChannelUpdate { .. } => EventKind::ChannelUpdate,
            Self::ChannelDelete { .. } => EventKind::ChannelDelete,
            Self::ChannelGroupJoin { .. } => EventKind::ChannelGroupJoin,
            Self::ChannelGroupLeave { .. } => EventKind::ChannelGroupLeave,
            Self::ChannelStartTyping { .. } => EventKind::ChannelStartTyping,
            Self::ChannelStopTyping { .. } => EventKind::ChannelStopTyping,
            Self::ChannelAck { .. } => EventKind::ChannelAck,
            Self::ServerCreate(_) => EventKind::ServerCreate,
            Self::ServerUpdate { .. } => EventKind::ServerUpdate,
            Self::ServerDelete { .. } => EventKind::ServerDelete,
            Self::ServerMemberJoin { .. } => EventKind::ServerMemberJoin,
            Self::ServerMemberLeave { .. } => EventKind::ServerMemberLeave,
            Self::ServerMemberUpdate { .. } => EventKind::ServerMemberUpdate,
            Self::ServerRoleUpdate { .. } => EventKind::ServerRoleUpdate,
            Self::ServerRoleDelete { .. } => EventKind::ServerRoleDelete,
            Self::UserUpdate { .. } => EventKind::UserUpdate,
            Self::UserRelationship { .. } => EventKind::UserRelationship,
        }
    }

    /// Deserialize a frame from wire text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ClientFrame {
    /// Serialize the frame to wire text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
