//! Entities - the typed mirror of remote chat-service state
//!
//! Every entity is a plain value type: cache reads hand out clones, and
//! "before" snapshots for update events are full field-for-field copies.
//! Partial updates arrive as patch structs (changed fields only) plus a
//! list of clear-field markers; fields named in the clear list are reset
//! to absent, never left stale.

mod channel;
mod invite;
mod member;
mod message;
mod server;
mod user;

pub use channel::{Channel, ChannelField, ChannelPatch, ChannelType};
pub use invite::{Invite, InviteType};
pub use member::{Member, MemberData, MemberField, MemberPatch};
pub use message::{Embed, EmbedImageSize, Masquerade, Message, MessageData, MessagePatch};
pub use server::{
    Category, Role, RoleData, RoleField, RolePatch, Server, ServerField, ServerPatch,
    SystemMessages,
};
pub use user::{BotInfo, Presence, Relationship, Status, User, UserField, UserPatch};
