//! Server entity and its owned roles
//!
//! Roles exist only as children of exactly one server; deleting a server
//! invalidates its roles. Structural fields (channels, roles, categories)
//! are replaced wholesale on update, matching the wire contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::DomainError;
use crate::value_objects::{ChannelId, Permissions, RoleId, ServerId, UserId};

/// Role owned by a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Permissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
}

impl Role {
    /// Build a role from its wire form plus the map key it was stored under
    pub fn from_data(id: RoleId, data: RoleData) -> Self {
        Self {
            id,
            name: data.name,
            permissions: data.permissions,
            colour: data.colour,
            hoist: data.hoist,
            rank: data.rank,
        }
    }

    /// Construct a role fresh from an update payload
    ///
    /// Used when an update references a role the server does not hold yet;
    /// the payload must then carry the role's name.
    pub fn from_patch(id: RoleId, patch: RolePatch) -> Result<Self, DomainError> {
        let name = patch.name.ok_or_else(|| DomainError::RoleMissingName(id.clone()))?;
        Ok(Self {
            id,
            name,
            permissions: patch.permissions.unwrap_or_default(),
            colour: patch.colour,
            hoist: patch.hoist,
            rank: patch.rank,
        })
    }

    /// Apply a partial update, then execute the clear list
    pub fn apply(&mut self, patch: RolePatch, clear: &[RoleField]) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(permissions) = patch.permissions {
            self.permissions = permissions;
        }
        if let Some(colour) = patch.colour {
            self.colour = Some(colour);
        }
        if let Some(hoist) = patch.hoist {
            self.hoist = Some(hoist);
        }
        if let Some(rank) = patch.rank {
            self.rank = Some(rank);
        }
        for field in clear {
            match field {
                RoleField::Colour => self.colour = None,
            }
        }
    }
}

/// Wire form of a role: the identity lives in the enclosing map key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleData {
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
    pub colour: Option<String>,
    pub hoist: Option<bool>,
    pub rank: Option<i64>,
}

/// Partial update for a role; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolePatch {
    pub name: Option<String>,
    pub permissions: Option<Permissions>,
    pub colour: Option<String>,
    pub hoist: Option<bool>,
    pub rank: Option<i64>,
}

/// Clearable role fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RoleField {
    Colour,
}

/// Ordered grouping of server channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub channels: Vec<ChannelId>,
}

/// Channels the server posts system notices into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_joined: Option<ChannelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_left: Option<ChannelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_kicked: Option<ChannelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_banned: Option<ChannelId>,
}

/// Server entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ServerData")]
pub struct Server {
    pub id: ServerId,
    pub owner: UserId,
    pub name: String,
    pub description: Option<String>,
    /// Ordered channel list, IDs resolved against the channel cache
    pub channels: Vec<ChannelId>,
    pub categories: Option<Vec<Category>>,
    pub system_messages: Option<SystemMessages>,
    /// Roles keyed by their ID; the sole home of role state
    pub roles: HashMap<RoleId, Role>,
    pub default_permissions: Permissions,
    pub nsfw: Option<bool>,
    pub flags: Option<i64>,
    pub analytics: Option<bool>,
    pub discoverable: Option<bool>,
}

/// Wire form of a server: role map values carry no identity field
#[derive(Debug, Clone, Deserialize)]
pub struct ServerData {
    #[serde(rename = "_id")]
    pub id: ServerId,
    pub owner: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelId>,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub system_messages: Option<SystemMessages>,
    #[serde(default)]
    pub roles: Option<HashMap<RoleId, RoleData>>,
    #[serde(default)]
    pub default_permissions: Permissions,
    #[serde(default)]
    pub nsfw: Option<bool>,
    #[serde(default)]
    pub flags: Option<i64>,
    #[serde(default)]
    pub analytics: Option<bool>,
    #[serde(default)]
    pub discoverable: Option<bool>,
}

impl From<ServerData> for Server {
    fn from(data: ServerData) -> Self {
        let roles = data
            .roles
            .unwrap_or_default()
            .into_iter()
            .map(|(id, role)| (id.clone(), Role::from_data(id, role)))
            .collect();
        Self {
            id: data.id,
            owner: data.owner,
            name: data.name,
            description: data.description,
            channels: data.channels,
            categories: data.categories,
            system_messages: data.system_messages,
            roles,
            default_permissions: data.default_permissions,
            nsfw: data.nsfw,
            flags: data.flags,
            analytics: data.analytics,
            discoverable: data.discoverable,
        }
    }
}

impl Server {
    /// Check if a user owns this server
    #[inline]
    pub fn is_owner(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    /// Look up a role by ID
    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    /// Apply a partial update, then execute the clear list
    ///
    /// `channels`, `roles`, and `categories` are replaced wholesale when
    /// present.
    pub fn apply(&mut self, patch: ServerPatch, clear: &[ServerField]) {
        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(channels) = patch.channels {
            self.channels = channels;
        }
        if let Some(categories) = patch.categories {
            self.categories = Some(categories);
        }
        if let Some(system_messages) = patch.system_messages {
            self.system_messages = Some(system_messages);
        }
        if let Some(roles) = patch.roles {
            self.roles = roles
                .into_iter()
                .map(|(id, role)| (id.clone(), Role::from_data(id, role)))
                .collect();
        }
        if let Some(default_permissions) = patch.default_permissions {
            self.default_permissions = default_permissions;
        }
        if let Some(nsfw) = patch.nsfw {
            self.nsfw = Some(nsfw);
        }
        if let Some(flags) = patch.flags {
            self.flags = Some(flags);
        }
        if let Some(analytics) = patch.analytics {
            self.analytics = Some(analytics);
        }
        if let Some(discoverable) = patch.discoverable {
            self.discoverable = Some(discoverable);
        }
        for field in clear {
            self.clear_field(*field);
        }
    }

    fn clear_field(&mut self, field: ServerField) {
        match field {
            ServerField::Description => self.description = None,
            ServerField::Categories => self.categories = None,
            ServerField::SystemMessages => self.system_messages = None,
            // Icon and banner payloads are not mirrored
            ServerField::Icon | ServerField::Banner => {}
        }
    }
}

/// Partial update for a server; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerPatch {
    pub owner: Option<UserId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub channels: Option<Vec<ChannelId>>,
    pub categories: Option<Vec<Category>>,
    pub system_messages: Option<SystemMessages>,
    pub roles: Option<HashMap<RoleId, RoleData>>,
    pub default_permissions: Option<Permissions>,
    pub nsfw: Option<bool>,
    pub flags: Option<i64>,
    pub analytics: Option<bool>,
    pub discoverable: Option<bool>,
}

/// Clearable server fields, total over the wire vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ServerField {
    Icon,
    Banner,
    Description,
    Categories,
    SystemMessages,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Server {
        serde_json::from_str(
            r##"{
                "_id": "S1",
                "owner": "U1",
                "name": "testers",
                "description": "a place",
                "channels": ["C1", "C2"],
                "roles": {
                    "R1": {"name": "admin", "permissions": 8, "colour": "#ff0000"},
                    "R2": {"name": "member", "permissions": 1}
                },
                "default_permissions": 0
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_decode_injects_role_ids() {
        let server = server();
        assert_eq!(server.roles.len(), 2);
        let admin = server.role(&RoleId::new("R1")).unwrap();
        assert_eq!(admin.id, RoleId::new("R1"));
        assert_eq!(admin.name, "admin");
        assert_eq!(admin.colour.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_apply_replaces_structural_fields_wholesale() {
        let mut server = server();
        server.apply(
            ServerPatch {
                channels: Some(vec![ChannelId::new("C9")]),
                roles: Some(HashMap::from([(
                    RoleId::new("R9"),
                    RoleData {
                        name: "mod".to_string(),
                        permissions: Permissions::default(),
                        colour: None,
                        hoist: None,
                        rank: None,
                    },
                )])),
                ..ServerPatch::default()
            },
            &[],
        );
        assert_eq!(server.channels, vec![ChannelId::new("C9")]);
        assert_eq!(server.roles.len(), 1);
        assert!(server.role(&RoleId::new("R9")).is_some());
    }

    #[test]
    fn test_clear_description() {
        let mut server = server();
        server.apply(ServerPatch::default(), &[ServerField::Description]);
        assert_eq!(server.description, None);
    }

    #[test]
    fn test_role_from_patch_requires_name() {
        let err = Role::from_patch(RoleId::new("R1"), RolePatch::default()).unwrap_err();
        assert_eq!(err.code(), "ROLE_MISSING_NAME");

        let role = Role::from_patch(
            RoleId::new("R1"),
            RolePatch {
                name: Some("mods".to_string()),
                rank: Some(3),
                ..RolePatch::default()
            },
        )
        .unwrap();
        assert_eq!(role.name, "mods");
        assert_eq!(role.permissions, Permissions::empty());
    }

    #[test]
    fn test_role_apply_and_clear() {
        let mut role = Role::from_data(
            RoleId::new("R1"),
            RoleData {
                name: "admin".to_string(),
                permissions: Permissions::default(),
                colour: Some("#00ff00".to_string()),
                hoist: Some(true),
                rank: None,
            },
        );
        role.apply(
            RolePatch {
                name: Some("root".to_string()),
                ..RolePatch::default()
            },
            &[RoleField::Colour],
        );
        assert_eq!(role.name, "root");
        assert_eq!(role.colour, None);
        assert_eq!(role.hoist, Some(true));
    }
}
