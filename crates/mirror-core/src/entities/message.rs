//! Message entity and its embedded payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChannelId, MessageId, UserId};

/// Size hint for image embeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedImageSize {
    Large,
    Preview,
}

/// Rich embed attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Embed {
    Website {
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        site_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        colour: Option<String>,
    },
    Image {
        url: String,
        width: i64,
        height: i64,
        size: EmbedImageSize,
    },
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        icon_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        colour: Option<String>,
    },
    /// Placeholder the service sends while an embed is being generated
    None,
}

/// Author masquerade: display overrides for one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Masquerade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: UserId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<MessageId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<Masquerade>,
}

/// Wire form of a message; alias kept for symmetry with other entities
pub type MessageData = Message;

impl Message {
    /// Check if the message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited.is_some()
    }

    /// Check if the message replies to other messages
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.replies.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Check if the message mentions a user
    pub fn mentions_user(&self, user: &UserId) -> bool {
        self.mentions.as_ref().is_some_and(|m| m.contains(user))
    }

    /// Apply a partial update, merging present fields in place
    pub fn apply(&mut self, patch: MessagePatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(edited) = patch.edited {
            self.edited = Some(edited);
        }
        if let Some(embeds) = patch.embeds {
            self.embeds = Some(embeds);
        }
    }
}

/// Partial update for a message; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub edited: Option<DateTime<Utc>>,
    pub embeds: Option<Vec<Embed>>,
}
