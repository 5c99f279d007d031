//! Session facade
//!
//! Ties the transport, reconciler, and resource client together behind
//! the external API: `start(token)`, `close()`, `receive_next()`, listener
//! registration through `bus()`, and pull accessors with get-or-fetch
//! semantics. A single cooperative task is expected to drive
//! `receive_next()`; reconciliation of one frame completes before the
//! next begins, so events dispatch strictly in arrival order.

use std::sync::Arc;

use serde_json::json;

use mirror_common::MirrorConfig;
use mirror_core::{
    Channel, ChannelId, FetchError, Invite, InviteCode, Member, MemberId, Message, MessageId,
    Method, ResourceFetcher, Role, RoleId, Server, ServerId, User, UserId,
};
use mirror_http::RestClient;

use crate::bus::EventBus;
use crate::error::GatewayResult;
use crate::events::Reconciled;
use crate::protocol::ClientFrame;
use crate::reconcile::Reconciler;
use crate::transport::GatewayTransport;

/// A live gateway session over a locally mirrored state cache
pub struct Session {
    transport: GatewayTransport,
    reconciler: Reconciler,
    rest: Arc<RestClient>,
    self_user: Option<User>,
}

impl Session {
    /// Create a session from configuration; nothing connects yet
    pub fn new(config: MirrorConfig) -> GatewayResult<Self> {
        let rest = Arc::new(RestClient::new(&config.api)?);
        let fetcher: Arc<dyn ResourceFetcher> = rest.clone();
        Ok(Self {
            transport: GatewayTransport::new(Arc::clone(&fetcher), config.gateway),
            reconciler: Reconciler::new(fetcher),
            rest,
            self_user: None,
        })
    }

    /// Establish the persistent connection without authenticating
    pub async fn connect(&mut self) -> GatewayResult<()> {
        self.transport.connect().await
    }

    /// Connect, authenticate, and resolve the session's own user
    pub async fn start(&mut self, token: impl Into<String>) -> GatewayResult<()> {
        let token = token.into();
        self.connect().await?;
        self.transport.authenticate(token.clone()).await?;
        self.rest.set_token(token);

        let value = self.reconciler.cache().fetcher().get("/users/@me").await?;
        let user: User =
            serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))?;
        self.reconciler.cache_mut().insert_user(user.clone());
        tracing::info!(user_id = %user.id, "Session started");
        self.self_user = Some(user);
        Ok(())
    }

    /// Close the connection and stop the keep-alive scheduler
    pub async fn close(&mut self) {
        self.transport.close().await;
        self.rest.clear_token();
        tracing::info!("Session closed");
    }

    /// Await, reconcile, and dispatch the next inbound frame
    pub async fn receive_next(&mut self) -> GatewayResult<Reconciled> {
        let frame = self.transport.receive().await?;
        self.reconciler.reconcile(frame).await
    }

    /// Listener registration surface
    pub fn bus(&self) -> &EventBus {
        self.reconciler.bus()
    }

    /// The session's own user, available after `start`
    pub fn self_user(&self) -> Option<&User> {
        self.self_user.as_ref()
    }

    // === Pull accessors (get-or-fetch) ===

    /// Get a user, lazily fetched on cache miss
    pub async fn user(&mut self, id: &UserId) -> GatewayResult<User> {
        Ok(self
            .reconciler
            .cache_mut()
            .get_or_fetch_user(id)
            .await?
            .clone())
    }

    /// Get a channel, lazily fetched on cache miss
    pub async fn channel(&mut self, id: &ChannelId) -> GatewayResult<Channel> {
        Ok(self
            .reconciler
            .cache_mut()
            .get_or_fetch_channel(id)
            .await?
            .clone())
    }

    /// Get a server, lazily fetched on cache miss
    pub async fn server(&mut self, id: &ServerId) -> GatewayResult<Server> {
        Ok(self
            .reconciler
            .cache_mut()
            .get_or_fetch_server(id)
            .await?
            .clone())
    }

    /// Get a member, lazily fetched on cache miss
    pub async fn member(&mut self, server: &ServerId, user: &UserId) -> GatewayResult<Member> {
        let id = MemberId {
            server: server.clone(),
            user: user.clone(),
        };
        Ok(self
            .reconciler
            .cache_mut()
            .get_or_fetch_member(&id)
            .await?
            .clone())
    }

    /// Get a role from its server's role map
    ///
    /// Surfaces `NotFound` when the server does not hold the role.
    pub async fn role(&mut self, server: &ServerId, role: &RoleId) -> GatewayResult<Role> {
        let server = self.reconciler.cache_mut().get_or_fetch_server(server).await?;
        server
            .role(role)
            .cloned()
            .ok_or_else(|| FetchError::NotFound.into())
    }

    /// Get a message, lazily fetched on cache miss
    pub async fn message(
        &mut self,
        channel: &ChannelId,
        id: &MessageId,
    ) -> GatewayResult<Message> {
        Ok(self
            .reconciler
            .cache_mut()
            .get_or_fetch_message(channel, id)
            .await?
            .clone())
    }

    /// Get an invite, lazily fetched on cache miss
    pub async fn invite(&mut self, code: &InviteCode) -> GatewayResult<Invite> {
        Ok(self
            .reconciler
            .cache_mut()
            .get_or_fetch_invite(code)
            .await?
            .clone())
    }

    // === Outbound operations ===

    /// Send a message into a channel and admit it into the cache
    pub async fn send_message(
        &mut self,
        channel: &ChannelId,
        content: impl Into<String>,
    ) -> GatewayResult<Message> {
        let body = json!({ "content": content.into() });
        let value = self
            .rest
            .request(
                Method::Post,
                &format!("/channels/{channel}/messages"),
                &[],
                Some(body),
            )
            .await?;
        let message: Message =
            serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))?;
        self.reconciler
            .cache_mut()
            .admit_message(message.clone())
            .await?;
        Ok(message)
    }

    /// Show a typing indicator in a channel
    pub async fn begin_typing(&self, channel: &ChannelId) -> GatewayResult<()> {
        self.transport
            .send(ClientFrame::BeginTyping {
                channel: channel.clone(),
            })
            .await
    }

    /// Withdraw the typing indicator
    pub async fn end_typing(&self, channel: &ChannelId) -> GatewayResult<()> {
        self.transport
            .send(ClientFrame::EndTyping {
                channel: channel.clone(),
            })
            .await
    }

    /// Delete an invite remotely and evict it from the cache
    pub async fn delete_invite(&mut self, code: &InviteCode) -> GatewayResult<()> {
        self.rest
            .request(Method::Delete, &format!("/invites/{code}"), &[], None)
            .await?;
        self.reconciler.cache_mut().remove_invite(code);
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("reconciler", &self.reconciler)
            .field("self_user", &self.self_user.as_ref().map(|u| &u.id))
            .finish()
    }
}
