//! User entity - a remote user account

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Relationship between the session's own user and another user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Blocked,
    BlockedOther,
    Friend,
    Incoming,
    Outgoing,
    #[serde(rename = "None")]
    NoRelationship,
    /// The session's own user
    User,
}

/// Presence state advertised by a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    Busy,
    Idle,
    Invisible,
    Online,
}

/// Custom status: presence plus optional status text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Bot marker carried by bot accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    /// User that owns the bot
    pub owner: UserId,
}

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badges: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot: Option<BotInfo>,
}

impl User {
    /// Create a user with only the required fields
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            badges: None,
            online: None,
            relationship: None,
            status: None,
            flags: None,
            bot: None,
        }
    }

    /// Check if this is a bot account
    #[inline]
    pub fn is_bot(&self) -> bool {
        self.bot.is_some()
    }

    /// Get the mention string for this user
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Extract a user ID from a mention string like `<@01ABC>`
    pub fn parse_mention(content: &str) -> Option<UserId> {
        let inner = content.strip_prefix("<@")?.strip_suffix('>')?;
        if inner.is_empty() {
            return None;
        }
        Some(UserId::new(inner))
    }

    /// Apply a partial update, then execute the clear list
    pub fn apply(&mut self, patch: UserPatch, clear: &[UserField]) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(badges) = patch.badges {
            self.badges = Some(badges);
        }
        if let Some(online) = patch.online {
            self.online = Some(online);
        }
        if let Some(relationship) = patch.relationship {
            self.relationship = Some(relationship);
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(flags) = patch.flags {
            self.flags = Some(flags);
        }
        if let Some(bot) = patch.bot {
            self.bot = Some(bot);
        }
        for field in clear {
            self.clear_field(*field);
        }
    }

    fn clear_field(&mut self, field: UserField) {
        match field {
            UserField::StatusText => {
                if let Some(status) = &mut self.status {
                    status.text = None;
                }
            }
            UserField::StatusPresence => self.status = None,
            // Profile and avatar payloads are not mirrored
            UserField::Avatar | UserField::ProfileContent | UserField::ProfileBackground => {}
        }
    }
}

/// Partial update for a user; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub badges: Option<i64>,
    pub online: Option<bool>,
    pub relationship: Option<Relationship>,
    pub status: Option<Status>,
    pub flags: Option<i64>,
    pub bot: Option<BotInfo>,
}

/// Clearable user fields, total over the wire vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UserField {
    Avatar,
    StatusText,
    StatusPresence,
    ProfileContent,
    ProfileBackground,
}
