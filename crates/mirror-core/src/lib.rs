//! # mirror-core
//!
//! Domain layer containing entities, value objects, partial-update payloads,
//! and the resource-fetcher port. This crate has zero dependencies on
//! infrastructure (HTTP client, WebSocket, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    BotInfo, Category, Channel, ChannelField, ChannelPatch, ChannelType, Embed, EmbedImageSize,
    Invite, InviteType, Masquerade, Member, MemberData, MemberField, MemberPatch, Message,
    MessageData, MessagePatch, Presence, Relationship, Role, RoleData, RoleField, RolePatch,
    Server, ServerField, ServerPatch, Status, SystemMessages, User, UserField, UserPatch,
};
pub use error::{DomainError, FetchError};
pub use traits::{FetchResult, Method, ResourceFetcher};
pub use value_objects::{
    ChannelId, InviteCode, MemberId, MemberIdParseError, MessageId, Permissions, RoleId, ServerId,
    UserId,
};
