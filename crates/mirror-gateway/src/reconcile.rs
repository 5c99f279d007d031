//! Event reconciliation
//!
//! One transition per inbound frame tag, with no state beyond the entity
//! cache: given the cache contents, each call is independent. Updates
//! produce a full "before" clone, apply the patch and clear list to a
//! live copy, insert the copy as the new canonical snapshot, and dispatch
//! (before, after). Deletes of uncached IDs and lazy-fetch misses on
//! leave paths degrade to silent no-ops that still return the frame tag.

use std::sync::Arc;

use mirror_cache::EntityCache;
use mirror_core::{Channel, ChannelId, FetchError, MemberId, ResourceFetcher, Role, User, UserId};

use crate::bus::EventBus;
use crate::error::{GatewayError, GatewayResult};
use crate::events::{Event, EventKind, Reconciled};
use crate::protocol::ServerFrame;

/// Applies inbound frames to the cache and dispatches the results
pub struct Reconciler {
    cache: EntityCache,
    bus: EventBus,
}

impl Reconciler {
    /// Create a reconciler over an empty cache
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            cache: EntityCache::new(fetcher),
            bus: EventBus::new(),
        }
    }

    /// The listener bus fed by this reconciler
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Read access to the cache
    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Mutable access to the cache
    pub fn cache_mut(&mut self) -> &mut EntityCache {
        &mut self.cache
    }

    /// Reconcile one inbound frame: classify, mutate the cache, dispatch
    ///
    /// Frames are processed strictly in call order; a `Bulk` frame
    /// reconciles its sub-frames recursively in embedded order and
    /// produces no dispatch of its own. A remote `Error` frame is always
    /// terminal and returns `Err`, never a dispatch.
    pub async fn reconcile(&mut self, frame: ServerFrame) -> GatewayResult<Reconciled> {
        let kind = frame.kind();
        tracing::trace!(kind = %kind, "Reconciling frame");

        match frame {
            ServerFrame::Error { error } => {
                tracing::error!(code = ?error, "Remote error frame");
                Err(GatewayError::Protocol(error.into()))
            }

            ServerFrame::Authenticated => self.emit(Event::Authenticated).await,

            ServerFrame::Pong { data } => self.emit(Event::Pong { data }).await,

            ServerFrame::Bulk { v } => {
                for sub in v {
                    Box::pin(self.reconcile(sub)).await?;
                }
                Ok(Reconciled::silent(EventKind::Bulk))
            }

            ServerFrame::Ready {
                users,
                channels,
                servers,
                members,
            } => {
                let resolved =
                    self.cache
                        .replace_all(users.clone(), channels.clone(), servers.clone(), members);
                self.emit(Event::Ready {
                    users,
                    channels,
                    servers,
                    members: resolved,
                })
                .await
            }

            ServerFrame::Message(message) => {
                self.cache.admit_message(message.clone()).await?;
                self.emit(Event::Message(message)).await
            }

            ServerFrame::MessageUpdate { id, channel, data } => {
                let before = self.cache.get_or_fetch_message(&channel, &id).await?.clone();
                let mut after = before.clone();
                after.apply(data);
                self.cache.insert_message(after.clone());

                // an update that leaves the content unchanged is
                // observable in the cache but not worth a dispatch
                if after.content == before.content {
                    tracing::trace!(message_id = %id, "Message update suppressed: content unchanged");
                    return Ok(Reconciled::silent(kind));
                }
                self.emit(Event::MessageUpdate { before, after }).await
            }

            ServerFrame::MessageDelete { id, .. } => match self.cache.remove_message(&id) {
                Some(message) => self.emit(Event::MessageDelete(message)).await,
                None => Ok(Reconciled::silent(kind)),
            },

            ServerFrame::ChannelCreate(channel) => {
                self.cache.insert_channel(channel.clone());
                self.emit(Event::ChannelCreate(channel)).await
            }

            ServerFrame::ChannelUpdate { id, data, clear } => {
                let before = self.cache.get_or_fetch_channel(&id).await?.clone();
                let mut after = before.clone();
                after.apply(data, &clear);
                self.cache.insert_channel(after.clone());
                self.emit(Event::ChannelUpdate { before, after }).await
            }

            ServerFrame::ChannelDelete { id } => match self.cache.remove_channel(&id) {
                Some(channel) => self.emit(Event::ChannelDelete(channel)).await,
                None => Ok(Reconciled::silent(kind)),
            },

            ServerFrame::ChannelGroupJoin { id, user } => {
                let mut channel = self.cache.get_or_fetch_channel(&id).await?.clone();
                let user = self.cache.get_or_fetch_user(&user).await?.clone();
                channel.attach_recipient(&user.id);
                self.cache.insert_channel(channel.clone());
                self.emit(Event::ChannelGroupJoin { channel, user }).await
            }

            ServerFrame::ChannelGroupLeave { id, user } => {
                let channel = match self.cache.get_or_fetch_channel(&id).await {
                    Ok(channel) => channel.clone(),
                    Err(e) => return self.degrade_if_missing(kind, e),
                };
                let user = match self.cache.get_or_fetch_user(&user).await {
                    Ok(user) => user.clone(),
                    Err(e) => return self.degrade_if_missing(kind, e),
                };
                let mut channel = channel;
                channel.detach_recipient(&user.id);
                self.cache.insert_channel(channel.clone());
                self.emit(Event::ChannelGroupLeave { channel, user }).await
            }

            ServerFrame::ChannelStartTyping { id, user } => {
                let (channel, user) = self.resolve_channel_user(&id, &user).await?;
                self.emit(Event::ChannelStartTyping { channel, user }).await
            }

            ServerFrame::ChannelStopTyping { id, user } => {
                let (channel, user) = self.resolve_channel_user(&id, &user).await?;
                self.emit(Event::ChannelStopTyping { channel, user }).await
            }

            ServerFrame::ChannelAck {
                id,
                user,
                message_id,
            } => {
                let (channel, user) = self.resolve_channel_user(&id, &user).await?;
                self.emit(Event::ChannelAck {
                    channel,
                    user,
                    message_id,
                })
                .await
            }

            ServerFrame::ServerCreate(server) => {
                self.cache.insert_server(server.clone());
                self.emit(Event::ServerCreate(server)).await
            }

            ServerFrame::ServerUpdate { id, data, clear } => {
                let before = self.cache.get_or_fetch_server(&id).await?.clone();
                let mut after = before.clone();
                after.apply(data, &clear);
                self.cache.insert_server(after.clone());
                self.emit(Event::ServerUpdate { before, after }).await
            }

            ServerFrame::ServerDelete { id } => match self.cache.remove_server(&id) {
                Some(server) => self.emit(Event::ServerDelete(server)).await,
                None => Ok(Reconciled::silent(kind)),
            },

            ServerFrame::ServerMemberJoin { id, user } => {
                let member_id = MemberId {
                    server: id,
                    user: user.clone(),
                };
                let member = self.cache.get_or_fetch_member(&member_id).await?.clone();
                let user = self.cache.get_or_fetch_user(&user).await?.clone();
                self.emit(Event::ServerMemberJoin { member, user }).await
            }

            ServerFrame::ServerMemberLeave { id, user } => {
                let member_id = MemberId {
                    server: id,
                    user: user.clone(),
                };
                let member = match self.cache.get_or_fetch_member(&member_id).await {
                    Ok(member) => member.clone(),
                    Err(e) => return self.degrade_if_missing(kind, e),
                };
                let user = match self.cache.get_or_fetch_user(&user).await {
                    Ok(user) => user.clone(),
                    Err(e) => return self.degrade_if_missing(kind, e),
                };
                self.cache.remove_member(&member_id);
                self.emit(Event::ServerMemberLeave { member, user }).await
            }

            ServerFrame::ServerMemberUpdate { id, data, clear } => {
                let before = self.cache.get_or_fetch_member(&id).await?.clone();
                let roles = self
                    .cache
                    .server(&id.server)
                    .map(|server| server.roles.clone())
                    .unwrap_or_default();
                let mut after = before.clone();
                after.apply(data, &clear, &roles);
                self.cache.insert_member(after.clone());
                self.emit(Event::ServerMemberUpdate { before, after }).await
            }

            ServerFrame::ServerRoleUpdate {
                id,
                role_id,
                data,
                clear,
            } => {
                let mut server = self.cache.get_or_fetch_server(&id).await?.clone();
                let role = match server.roles.get_mut(&role_id) {
                    Some(role) => {
                        role.apply(data, &clear);
                        role.clone()
                    }
                    None => {
                        // unseen role: built fresh, so the payload must
                        // carry the role's name
                        let role = Role::from_patch(role_id.clone(), data)?;
                        server.roles.insert(role_id, role.clone());
                        role
                    }
                };
                self.cache.insert_server(server.clone());
                self.emit(Event::ServerRoleUpdate { server, role }).await
            }

            ServerFrame::ServerRoleDelete { id, role_id } => {
                let mut server = self.cache.get_or_fetch_server(&id).await?.clone();
                match server.roles.remove(&role_id) {
                    Some(role) => {
                        self.cache.insert_server(server.clone());
                        self.emit(Event::ServerRoleDelete { server, role }).await
                    }
                    None => Ok(Reconciled::silent(kind)),
                }
            }

            ServerFrame::UserUpdate { id, data, clear } => {
                let before = self.cache.get_or_fetch_user(&id).await?.clone();
                let mut after = before.clone();
                after.apply(data, &clear);
                self.cache.insert_user(after.clone());
                self.emit(Event::UserUpdate { before, after }).await
            }

            ServerFrame::UserRelationship { user, status } => {
                let mut user = self.cache.get_or_fetch_user(&user).await?.clone();
                user.relationship = Some(status);
                self.cache.insert_user(user.clone());
                self.emit(Event::UserRelationship {
                    user,
                    relationship: status,
                })
                .await
            }
        }
    }

    /// Dispatch an event and report it as the reconciliation outcome
    async fn emit(&self, event: Event) -> GatewayResult<Reconciled> {
        self.bus.dispatch(event.clone()).await;
        Ok(Reconciled::dispatched(event))
    }

    /// Resolve a channel/user pair referenced by an event, without mutation
    async fn resolve_channel_user(
        &mut self,
        channel: &ChannelId,
        user: &UserId,
    ) -> GatewayResult<(Channel, User)> {
        let channel = self.cache.get_or_fetch_channel(channel).await?.clone();
        let user = self.cache.get_or_fetch_user(user).await?.clone();
        Ok((channel, user))
    }

    /// Degrade a lazy-fetch miss on a leave path to a silent no-op
    fn degrade_if_missing(&self, kind: EventKind, error: FetchError) -> GatewayResult<Reconciled> {
        if error.is_not_found() {
            tracing::debug!(kind = %kind, "Leave target already gone; no-op");
            Ok(Reconciled::silent(kind))
        } else {
            Err(error.into())
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").field("cache", &self.cache).finish()
    }
}
