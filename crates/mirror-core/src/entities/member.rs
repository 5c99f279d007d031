//! Member entity - a user's membership in one server
//!
//! A member is never constructed unless both its user and server are
//! resolvable; the cache layer enforces that before insertion. The roles
//! held here are resolved copies from the owning server's role map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::server::Role;
use crate::value_objects::{MemberId, RoleId};

/// Member entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub nickname: Option<String>,
    /// Resolved role list; role IDs missing from the server are dropped
    pub roles: Vec<Role>,
}

impl Member {
    /// Build a member from its wire form, resolving role IDs against the
    /// owning server's role map
    pub fn from_data(data: MemberData, server_roles: &HashMap<RoleId, Role>) -> Self {
        let roles = resolve_roles(data.roles.unwrap_or_default(), server_roles);
        Self {
            id: data.id,
            nickname: data.nickname,
            roles,
        }
    }

    /// Display name: nickname when set, otherwise the given username
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.nickname.as_deref().unwrap_or(username)
    }

    /// Check if the member holds a role
    #[inline]
    pub fn has_role(&self, role_id: &RoleId) -> bool {
        self.roles.iter().any(|r| &r.id == role_id)
    }

    /// Apply a partial update, then execute the clear list
    ///
    /// A `roles` entry replaces the resolved list wholesale, resolved
    /// against the owning server's current role map.
    pub fn apply(
        &mut self,
        patch: MemberPatch,
        clear: &[MemberField],
        server_roles: &HashMap<RoleId, Role>,
    ) {
        if let Some(nickname) = patch.nickname {
            self.nickname = Some(nickname);
        }
        if let Some(role_ids) = patch.roles {
            self.roles = resolve_roles(role_ids, server_roles);
        }
        for field in clear {
            match field {
                MemberField::Nickname => self.nickname = None,
                MemberField::Roles => self.roles.clear(),
                // Avatar payloads are not mirrored
                MemberField::Avatar => {}
            }
        }
    }
}

fn resolve_roles(role_ids: Vec<RoleId>, server_roles: &HashMap<RoleId, Role>) -> Vec<Role> {
    role_ids
        .into_iter()
        .filter_map(|id| server_roles.get(&id).cloned())
        .collect()
}

/// Wire form of a member
#[derive(Debug, Clone, Deserialize)]
pub struct MemberData {
    #[serde(rename = "_id")]
    pub id: MemberId,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<RoleId>>,
}

/// Partial update for a member; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberPatch {
    pub nickname: Option<String>,
    pub roles: Option<Vec<RoleId>>,
}

/// Clearable member fields, total over the wire vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MemberField {
    Nickname,
    Avatar,
    Roles,
}
