//! Entity cache keyed by kind and ID
//!
//! Exclusively owned by the session for its lifetime; reconciliation runs
//! on a single cooperative task, so no internal locking is needed. Growth
//! is unbounded: entries live until an explicit delete event or a `Ready`
//! wholesale replace. Callers needing eviction should wrap the cache.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use mirror_core::{
    Channel, ChannelId, FetchError, Invite, InviteCode, Member, MemberData, MemberId, Message,
    MessageId, ResourceFetcher, Server, ServerId, User, UserId,
};

/// Result type for cache operations
pub type CacheResult<T> = Result<T, FetchError>;

/// Process-local mirror of remote entity state
pub struct EntityCache {
    fetcher: Arc<dyn ResourceFetcher>,
    users: HashMap<UserId, User>,
    channels: HashMap<ChannelId, Channel>,
    servers: HashMap<ServerId, Server>,
    members: HashMap<MemberId, Member>,
    messages: HashMap<MessageId, Message>,
    invites: HashMap<InviteCode, Invite>,
}

impl EntityCache {
    /// Create an empty cache backed by the given fetcher
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            users: HashMap::new(),
            channels: HashMap::new(),
            servers: HashMap::new(),
            members: HashMap::new(),
            messages: HashMap::new(),
            invites: HashMap::new(),
        }
    }

    /// Drop every cached entity
    pub fn clear(&mut self) {
        self.users.clear();
        self.channels.clear();
        self.servers.clear();
        self.members.clear();
        self.messages.clear();
        self.invites.clear();
    }

    /// Replace the cache wholesale from an initial snapshot
    ///
    /// Member roles are resolved against the servers supplied in the same
    /// snapshot. Returns the resolved members in snapshot order.
    pub fn replace_all(
        &mut self,
        users: Vec<User>,
        channels: Vec<Channel>,
        servers: Vec<Server>,
        members: Vec<MemberData>,
    ) -> Vec<Member> {
        self.clear();
        for user in users {
            self.users.insert(user.id.clone(), user);
        }
        for channel in channels {
            self.channels.insert(channel.id().clone(), channel);
        }
        for server in servers {
            self.servers.insert(server.id.clone(), server);
        }
        let mut resolved = Vec::with_capacity(members.len());
        for data in members {
            let member = match self.servers.get(&data.id.server) {
                Some(server) => Member::from_data(data, &server.roles),
                None => Member::from_data(data, &HashMap::new()),
            };
            self.members.insert(member.id.clone(), member.clone());
            resolved.push(member);
        }
        tracing::debug!(
            users = self.users.len(),
            channels = self.channels.len(),
            servers = self.servers.len(),
            members = self.members.len(),
            "Cache replaced from snapshot"
        );
        resolved
    }

    // === Users ===

    /// Cached user, if present
    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    /// Mutable access to a cached user
    pub fn user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        self.users.get_mut(id)
    }

    /// Cached user, fetched and inserted on miss
    pub async fn get_or_fetch_user(&mut self, id: &UserId) -> CacheResult<&User> {
        if !self.users.contains_key(id) {
            tracing::debug!(user_id = %id, "User cache miss, fetching");
            let value = self.fetcher.get(&format!("/users/{id}")).await?;
            let user: User = decode(value)?;
            self.users.insert(user.id.clone(), user);
        }
        Ok(&self.users[id])
    }

    /// Insert a user, replacing any previous snapshot
    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Remove a user; returns the removed snapshot
    pub fn remove_user(&mut self, id: &UserId) -> Option<User> {
        self.users.remove(id)
    }

    // === Channels ===

    /// Cached channel, if present
    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.get(id)
    }

    /// Mutable access to a cached channel
    pub fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(id)
    }

    /// Cached channel, fetched and inserted on miss
    pub async fn get_or_fetch_channel(&mut self, id: &ChannelId) -> CacheResult<&Channel> {
        if !self.channels.contains_key(id) {
            tracing::debug!(channel_id = %id, "Channel cache miss, fetching");
            let value = self.fetcher.get(&format!("/channels/{id}")).await?;
            let channel: Channel = decode(value)?;
            self.channels.insert(channel.id().clone(), channel);
        }
        Ok(&self.channels[id])
    }

    /// Insert a channel, replacing any previous snapshot
    pub fn insert_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.id().clone(), channel);
    }

    /// Remove a channel; returns the removed snapshot
    pub fn remove_channel(&mut self, id: &ChannelId) -> Option<Channel> {
        self.channels.remove(id)
    }

    // === Servers ===

    /// Cached server, if present
    pub fn server(&self, id: &ServerId) -> Option<&Server> {
        self.servers.get(id)
    }

    /// Mutable access to a cached server
    pub fn server_mut(&mut self, id: &ServerId) -> Option<&mut Server> {
        self.servers.get_mut(id)
    }

    /// Cached server, fetched and inserted on miss
    pub async fn get_or_fetch_server(&mut self, id: &ServerId) -> CacheResult<&Server> {
        if !self.servers.contains_key(id) {
            tracing::debug!(server_id = %id, "Server cache miss, fetching");
            let value = self.fetcher.get(&format!("/servers/{id}")).await?;
            let server: Server = decode(value)?;
            self.servers.insert(server.id.clone(), server);
        }
        Ok(&self.servers[id])
    }

    /// Insert a server, replacing any previous snapshot
    pub fn insert_server(&mut self, server: Server) {
        self.servers.insert(server.id.clone(), server);
    }

    /// Remove a server; returns the removed snapshot
    ///
    /// The server's roles die with it; there is no separate role cache.
    pub fn remove_server(&mut self, id: &ServerId) -> Option<Server> {
        self.servers.remove(id)
    }

    // === Members ===

    /// Cached member, if present
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    /// Mutable access to a cached member
    pub fn member_mut(&mut self, id: &MemberId) -> Option<&mut Member> {
        self.members.get_mut(id)
    }

    /// Cached member, fetched and inserted on miss
    ///
    /// A member is only admitted once its user and server are themselves
    /// resolvable; both are fetched first when absent.
    pub async fn get_or_fetch_member(&mut self, id: &MemberId) -> CacheResult<&Member> {
        if !self.members.contains_key(id) {
            tracing::debug!(member_id = %id, "Member cache miss, fetching");
            self.get_or_fetch_user(&id.user).await?;
            self.get_or_fetch_server(&id.server).await?;

            let path = format!("/servers/{}/members/{}", id.server, id.user);
            let value = self.fetcher.get(&path).await?;
            let data: MemberData = decode(value)?;
            let roles = &self.servers[&id.server].roles;
            let member = Member::from_data(data, roles);
            self.members.insert(member.id.clone(), member);
        }
        Ok(&self.members[id])
    }

    /// Insert a member, replacing any previous snapshot
    pub fn insert_member(&mut self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }

    /// Remove a member; returns the removed snapshot
    pub fn remove_member(&mut self, id: &MemberId) -> Option<Member> {
        self.members.remove(id)
    }

    // === Messages ===

    /// Cached message, if present
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    /// Mutable access to a cached message
    pub fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.get_mut(id)
    }

    /// Cached message, fetched and inserted on miss
    ///
    /// Message lookup needs the channel for the fetch path; the referenced
    /// channel and author are resolved into cache alongside the message.
    pub async fn get_or_fetch_message(
        &mut self,
        channel: &ChannelId,
        id: &MessageId,
    ) -> CacheResult<&Message> {
        if !self.messages.contains_key(id) {
            tracing::debug!(message_id = %id, channel_id = %channel, "Message cache miss, fetching");
            let path = format!("/channels/{channel}/messages/{id}");
            let value = self.fetcher.get(&path).await?;
            let message: Message = decode(value)?;
            self.admit_message(message).await?;
        }
        Ok(&self.messages[id])
    }

    /// Insert a message whose references are already resolved
    pub fn insert_message(&mut self, message: Message) {
        self.messages.insert(message.id.clone(), message);
    }

    /// Insert a message after resolving its channel and author references
    pub async fn admit_message(&mut self, message: Message) -> CacheResult<()> {
        self.get_or_fetch_channel(&message.channel).await?;
        self.get_or_fetch_user(&message.author).await?;
        self.messages.insert(message.id.clone(), message);
        Ok(())
    }

    /// Remove a message; returns the removed snapshot
    pub fn remove_message(&mut self, id: &MessageId) -> Option<Message> {
        self.messages.remove(id)
    }

    // === Invites ===

    /// Cached invite, if present
    pub fn invite(&self, code: &InviteCode) -> Option<&Invite> {
        self.invites.get(code)
    }

    /// Cached invite, fetched and inserted on miss
    pub async fn get_or_fetch_invite(&mut self, code: &InviteCode) -> CacheResult<&Invite> {
        if !self.invites.contains_key(code) {
            tracing::debug!(code = %code, "Invite cache miss, fetching");
            let value = self.fetcher.get(&format!("/invites/{code}")).await?;
            let invite: Invite = decode(value)?;
            self.invites.insert(invite.code().clone(), invite);
        }
        Ok(&self.invites[code])
    }

    /// Remove an invite; returns the removed snapshot
    pub fn remove_invite(&mut self, code: &InviteCode) -> Option<Invite> {
        self.invites.remove(code)
    }

    /// Access the backing fetcher
    pub fn fetcher(&self) -> &Arc<dyn ResourceFetcher> {
        &self.fetcher
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("users", &self.users.len())
            .field("channels", &self.channels.len())
            .field("servers", &self.servers.len())
            .field("members", &self.members.len())
            .field("messages", &self.messages.len())
            .field("invites", &self.invites.len())
            .finish()
    }
}

/// Decode a fetched JSON value into an entity
fn decode<T: DeserializeOwned>(value: Value) -> CacheResult<T> {
    serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
}
