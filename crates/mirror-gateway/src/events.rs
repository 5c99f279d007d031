//! Reconciled events
//!
//! The reconciler turns each inbound frame into a [`Reconciled`] outcome:
//! the frame's kind tag, plus the typed event payload when listener
//! dispatch occurred. Update events carry structurally independent
//! before/after snapshots.

use std::fmt;

use mirror_core::{Channel, Member, Message, MessageId, Relationship, Role, Server, User};

/// Tag identifying an event kind; mirrors the wire `type` vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    Authenticated,
    Pong,
    Bulk,
    Ready,
    Message,
    MessageUpdate,
    MessageDelete,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    ChannelGroupJoin,
    ChannelGroupLeave,
    ChannelStartTyping,
    ChannelStopTyping,
    ChannelAck,
    ServerCreate,
    ServerUpdate,
    ServerDelete,
    ServerMemberJoin,
    ServerMemberLeave,
    ServerMemberUpdate,
    ServerRoleUpdate,
    ServerRoleDelete,
    UserUpdate,
    UserRelationship,
}

impl EventKind {
    /// Get the wire tag string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Authenticated => "Authenticated",
            Self::Pong => "Pong",
            Self::Bulk => "Bulk",
            Self::Ready => "Ready",
            Self::Message => "Message",
            Self::MessageUpdate => "MessageUpdate",
            Self::MessageDelete => "MessageDelete",
            Self::ChannelCreate => "ChannelCreate",
            Self::ChannelUpdate => "ChannelUpdate",
            Self::ChannelDelete => "ChannelDelete",
            Self::ChannelGroupJoin => "ChannelGroupJoin",
            Self::ChannelGroupLeave => "ChannelGroupLeave",
            Self::ChannelStartTyping => "ChannelStartTyping",
            Self::ChannelStopTyping => "ChannelStopTyping",
            Self::ChannelAck => "ChannelAck",
            Self::ServerCreate => "ServerCreate",
            Self::ServerUpdate => "ServerUpdate",
            Self::ServerDelete => "ServerDelete",
            Self::ServerMemberJoin => "ServerMemberJoin",
            Self::ServerMemberLeave => "ServerMemberLeave",
            Self::ServerMemberUpdate => "ServerMemberUpdate",
            Self::ServerRoleUpdate => "ServerRoleUpdate",
            Self::ServerRoleDelete => "ServerRoleDelete",
            Self::UserUpdate => "UserUpdate",
            Self::UserRelationship => "UserRelationship",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reconciled event ready for listener dispatch
#[derive(Debug, Clone)]
pub enum Event {
    Authenticated,
    Pong {
        data: i64,
    },
    /// Initial snapshot, carrying the four decoded entity lists
    Ready {
        users: Vec<User>,
        channels: Vec<Channel>,
        servers: Vec<Server>,
        members: Vec<Member>,
    },
    Message(Message),
    MessageUpdate {
        before: Message,
        after: Message,
    },
    MessageDelete(Message),
    ChannelCreate(Channel),
    ChannelUpdate {
        before: Channel,
        after: Channel,
    },
    ChannelDelete(Channel),
    ChannelGroupJoin {
        channel: Channel,
        user: User,
    },
    ChannelGroupLeave {
        channel: Channel,
        user: User,
    },
    ChannelStartTyping {
        channel: Channel,
        user: User,
    },
    ChannelStopTyping {
        channel: Channel,
        user: User,
    },
    ChannelAck {
        channel: Channel,
        user: User,
        message_id: MessageId,
    },
    ServerCreate(Server),
    ServerUpdate {
        before: Server,
        after: Server,
    },
    ServerDelete(Server),
    ServerMemberJoin {
        member: Member,
        user: User,
    },
    ServerMemberLeave {
        member: Member,
        user: User,
    },
    ServerMemberUpdate {
        before: Member,
        after: Member,
    },
    ServerRoleUpdate {
        server: Server,
        role: Role,
    },
    ServerRoleDelete {
        server: Server,
        role: Role,
    },
    UserUpdate {
        before: User,
        after: User,
    },
    UserRelationship {
        user: User,
        relationship: Relationship,
    },
}

impl Event {
    /// Get the kind tag of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Authenticated => EventKind::Authenticated,
            Self::Pong { .. } => EventKind::Pong,
            Self::Ready { .. } => EventKind::Ready,
            Self::Message(_) => EventKind::Message,
            Self::MessageUpdate { .. } => EventKind::MessageUpdate,
            Self::MessageDelete(_) => EventKind::MessageDelete,
            Self::ChannelCreate(_) => EventKind::ChannelCreate,
            Self::ChannelUpdate { .. } => EventKind::ChannelUpdate,
            Self::ChannelDelete(_) => EventKind::ChannelDelete,
            Self::ChannelGroupJoin { .. } => EventKind::ChannelGroupJoin,
            Self::ChannelGroupLeave { .. } => EventKind::ChannelGroupLeave,
            Self::ChannelStartTyping { .. } => EventKind::ChannelStartTyping,
            Self::ChannelStopTyping { .. } => EventKind::ChannelStopTyping,
            Self::ChannelAck { .. } => EventKind::ChannelAck,
            Self::ServerCreate(_) => EventKind::ServerCreate,
            Self::ServerUpdate { .. } => EventKind::ServerUpdate,
            Self::ServerDelete(_) => EventKind::ServerDelete,
            Self::ServerMemberJoin { .. } => EventKind::ServerMemberJoin,
            Self::ServerMemberLeave { .. } => EventKind::ServerMemberLeave,
            Self::ServerMemberUpdate { .. } => EventKind::ServerMemberUpdate,
            Self::ServerRoleUpdate { .. } => EventKind::ServerRoleUpdate,
            Self::ServerRoleDelete { .. } => EventKind::ServerRoleDelete,
            Self::UserUpdate { .. } => EventKind::UserUpdate,
            Self::UserRelationship { .. } => EventKind::UserRelationship,
        }
    }
}

/// Outcome of reconciling one inbound frame
///
/// `kind` is always the frame's tag; `event` is present exactly when
/// listener dispatch occurred. No-op deletes and suppressed updates
/// return the tag alone.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub kind: EventKind,
    pub event: Option<Event>,
}

impl Reconciled {
    /// Outcome with a dispatched event
    pub fn dispatched(event: Event) -> Self {
        Self {
            kind: event.kind(),
            event: Some(event),
        }
    }

    /// Outcome without dispatch: the tag alone
    pub fn silent(kind: EventKind) -> Self {
        Self { kind, event: None }
    }

    /// Check whether listener dispatch occurred
    #[inline]
    pub fn was_dispatched(&self) -> bool {
        self.event.is_some()
    }
}
