//! Channel entity - the five channel variants
//!
//! The variant is fixed at creation by the wire's `channel_type` tag; an
//! unknown tag is a decode error, never a silently missing value.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChannelId, MessageId, Permissions, ServerId, UserId};

/// Discriminant of a channel variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    SavedMessages,
    DirectMessage,
    Group,
    TextChannel,
    VoiceChannel,
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel_type")]
pub enum Channel {
    /// Personal notes channel, visible only to its user
    SavedMessages {
        #[serde(rename = "_id")]
        id: ChannelId,
        user: UserId,
    },
    /// One-to-one conversation
    DirectMessage {
        #[serde(rename = "_id")]
        id: ChannelId,
        active: bool,
        recipients: Vec<UserId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_message_id: Option<MessageId>,
    },
    /// Multi-user group conversation owned by one user
    Group {
        #[serde(rename = "_id")]
        id: ChannelId,
        name: String,
        recipients: Vec<UserId>,
        owner: UserId,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_message_id: Option<MessageId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        permissions: Option<Permissions>,
        #[serde(skip_serializing_if = "Option::is_none")]
        nsfw: Option<bool>,
    },
    /// Text channel belonging to a server
    TextChannel {
        #[serde(rename = "_id")]
        id: ChannelId,
        server: ServerId,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default_permissions: Option<Permissions>,
        #[serde(skip_serializing_if = "Option::is_none")]
        nsfw: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_message_id: Option<MessageId>,
    },
    /// Voice channel belonging to a server
    VoiceChannel {
        #[serde(rename = "_id")]
        id: ChannelId,
        server: ServerId,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default_permissions: Option<Permissions>,
        #[serde(skip_serializing_if = "Option::is_none")]
        nsfw: Option<bool>,
    },
}

impl Channel {
    /// Get the channel ID
    pub fn id(&self) -> &ChannelId {
        match self {
            Self::SavedMessages { id, .. }
            | Self::DirectMessage { id, .. }
            | Self::Group { id, .. }
            | Self::TextChannel { id, .. }
            | Self::VoiceChannel { id, .. } => id,
        }
    }

    /// Get the variant discriminant
    pub fn channel_type(&self) -> ChannelType {
        match self {
            Self::SavedMessages { .. } => ChannelType::SavedMessages,
            Self::DirectMessage { .. } => ChannelType::DirectMessage,
            Self::Group { .. } => ChannelType::Group,
            Self::TextChannel { .. } => ChannelType::TextChannel,
            Self::VoiceChannel { .. } => ChannelType::VoiceChannel,
        }
    }

    /// Get the channel name, for variants that carry one
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Group { name, .. }
            | Self::TextChannel { name, .. }
            | Self::VoiceChannel { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Get the owning server, for server channel variants
    pub fn server_id(&self) -> Option<&ServerId> {
        match self {
            Self::TextChannel { server, .. } | Self::VoiceChannel { server, .. } => Some(server),
            _ => None,
        }
    }

    /// Check if this channel belongs to a server
    #[inline]
    pub fn is_server_channel(&self) -> bool {
        self.server_id().is_some()
    }

    /// Get the recipient list, for direct-message and group variants
    pub fn recipients(&self) -> Option<&[UserId]> {
        match self {
            Self::DirectMessage { recipients, .. } | Self::Group { recipients, .. } => {
                Some(recipients)
            }
            _ => None,
        }
    }

    /// Attach a user to the recipient list
    ///
    /// Returns false for variants without recipients. Already-present
    /// users are not duplicated.
    pub fn attach_recipient(&mut self, user: &UserId) -> bool {
        match self {
            Self::DirectMessage { recipients, .. } | Self::Group { recipients, .. } => {
                if !recipients.contains(user) {
                    recipients.push(user.clone());
                }
                true
            }
            _ => false,
        }
    }

    /// Detach a user from the recipient list
    ///
    /// Returns false for variants without recipients or when the user was
    /// not a recipient.
    pub fn detach_recipient(&mut self, user: &UserId) -> bool {
        match self {
            Self::DirectMessage { recipients, .. } | Self::Group { recipients, .. } => {
                if let Some(pos) = recipients.iter().position(|r| r == user) {
                    recipients.remove(pos);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Apply a partial update, then execute the clear list
    ///
    /// Fields absent from the variant are ignored; the variant itself
    /// never changes.
    pub fn apply(&mut self, patch: ChannelPatch, clear: &[ChannelField]) {
        match self {
            Self::SavedMessages { .. } => {}
            Self::DirectMessage {
                active,
                last_message_id,
                ..
            } => {
                if let Some(new_active) = patch.active {
                    *active = new_active;
                }
                if let Some(id) = patch.last_message_id {
                    *last_message_id = Some(id);
                }
            }
            Self::Group {
                name,
                owner,
                description,
                last_message_id,
                permissions,
                nsfw,
                ..
            } => {
                if let Some(new_name) = patch.name {
                    *name = new_name;
                }
                if let Some(new_owner) = patch.owner {
                    *owner = new_owner;
                }
                if let Some(new_description) = patch.description {
                    *description = Some(new_description);
                }
                if let Some(id) = patch.last_message_id {
                    *last_message_id = Some(id);
                }
                if let Some(new_permissions) = patch.permissions {
                    *permissions = Some(new_permissions);
                }
                if let Some(new_nsfw) = patch.nsfw {
                    *nsfw = Some(new_nsfw);
                }
            }
            Self::TextChannel {
                name,
                description,
                default_permissions,
                nsfw,
                last_message_id,
                ..
            } => {
                if let Some(new_name) = patch.name {
                    *name = new_name;
                }
                if let Some(new_description) = patch.description {
                    *description = Some(new_description);
                }
                if let Some(new_default) = patch.default_permissions {
                    *default_permissions = Some(new_default);
                }
                if let Some(new_nsfw) = patch.nsfw {
                    *nsfw = Some(new_nsfw);
                }
                if let Some(id) = patch.last_message_id {
                    *last_message_id = Some(id);
                }
            }
            Self::VoiceChannel {
                name,
                description,
                default_permissions,
                nsfw,
                ..
            } => {
                if let Some(new_name) = patch.name {
                    *name = new_name;
                }
                if let Some(new_description) = patch.description {
                    *description = Some(new_description);
                }
                if let Some(new_default) = patch.default_permissions {
                    *default_permissions = Some(new_default);
                }
                if let Some(new_nsfw) = patch.nsfw {
                    *nsfw = Some(new_nsfw);
                }
            }
        }
        for field in clear {
            self.clear_field(*field);
        }
    }

    fn clear_field(&mut self, field: ChannelField) {
        match field {
            ChannelField::Description => match self {
                Self::Group { description, .. }
                | Self::TextChannel { description, .. }
                | Self::VoiceChannel { description, .. } => *description = None,
                _ => {}
            },
            ChannelField::DefaultPermissions => match self {
                Self::TextChannel {
                    default_permissions,
                    ..
                }
                | Self::VoiceChannel {
                    default_permissions,
                    ..
                } => *default_permissions = None,
                _ => {}
            },
            // Icon payloads are not mirrored
            ChannelField::Icon => {}
        }
    }
}

/// Partial update for a channel; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelPatch {
    pub name: Option<String>,
    pub owner: Option<UserId>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub permissions: Option<Permissions>,
    pub default_permissions: Option<Permissions>,
    pub nsfw: Option<bool>,
    pub last_message_id: Option<MessageId>,
}

/// Clearable channel fields, total over the wire vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ChannelField {
    Description,
    Icon,
    DefaultPermissions,
}
