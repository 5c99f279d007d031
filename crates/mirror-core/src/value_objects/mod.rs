//! Value objects - typed identifiers and permission bitflags

mod id;
mod permissions;

pub use id::{
    ChannelId, InviteCode, MemberId, MemberIdParseError, MessageId, RoleId, ServerId, UserId,
};
pub use permissions::Permissions;
