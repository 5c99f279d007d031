//! Gateway transport
//!
//! Owns the persistent WebSocket. A dedicated writer task owns all
//! outbound sends, draining an mpsc frame queue; the keep-alive scheduler
//! and `send()` both hand frames to it through that queue, so nothing
//! outside the writer ever touches the sink. Loss of connection is
//! terminal: there is no automatic reconnection, though `connect()` after
//! `close()` establishes a fresh link with a fresh keep-alive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use mirror_common::GatewayConfig;
use mirror_core::ResourceFetcher;

use crate::error::{GatewayError, GatewayResult, ProtocolError};
use crate::keepalive::KeepAlive;
use crate::protocol::{ClientFrame, ServerFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live connection state
struct Open {
    reader: SplitStream<WsStream>,
    outbound: mpsc::Sender<ClientFrame>,
    writer: JoinHandle<()>,
    keepalive: KeepAlive,
}

/// Persistent-connection transport
pub struct GatewayTransport {
    fetcher: Arc<dyn ResourceFetcher>,
    config: GatewayConfig,
    stalled: Arc<AtomicBool>,
    state: Option<Open>,
}

impl GatewayTransport {
    /// Create a closed transport; `connect()` opens the link
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, config: GatewayConfig) -> Self {
        Self {
            fetcher,
            config,
            stalled: Arc::new(AtomicBool::new(false)),
            state: None,
        }
    }

    /// Check whether the link is open
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Idempotently establish the persistent connection
    ///
    /// Resolves the gateway URL through the discovery path, opens the
    /// socket, starts the writer task and the keep-alive scheduler with a
    /// fresh stop signal.
    pub async fn connect(&mut self) -> GatewayResult<()> {
        if self.state.is_some() {
            return Ok(());
        }

        let url = self.discover_url().await?;
        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| GatewayError::Connect(e.to_string()))?;
        let (sink, reader) = socket.split();

        let (outbound, rx) = mpsc::channel(self.config.outbound_buffer);
        let writer = tokio::spawn(write_loop(sink, rx));

        self.stalled.store(false, Ordering::SeqCst);
        let keepalive = KeepAlive::start(
            outbound.clone(),
            self.config.heartbeat_interval(),
            self.config.send_timeout(),
            Arc::clone(&self.stalled),
        );

        self.state = Some(Open {
            reader,
            outbound,
            writer,
            keepalive,
        });
        tracing::info!(url = %url, "Gateway connected");
        Ok(())
    }

    /// Resolve the gateway URL via the discovery path
    async fn discover_url(&self) -> GatewayResult<String> {
        let value = self.fetcher.get(&self.config.discovery_path).await?;
        value
            .get("ws")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                ProtocolError::MalformedFrame(
                    "discovery response is missing the `ws` field".to_string(),
                )
                .into()
            })
    }

    /// Enqueue a frame for the writer task
    pub async fn send(&self, frame: ClientFrame) -> GatewayResult<()> {
        if self.stalled.load(Ordering::SeqCst) {
            return Err(GatewayError::KeepAliveStalled);
        }
        let open = self.state.as_ref().ok_or(GatewayError::ConnectionClosed)?;
        open.outbound
            .send(frame)
            .await
            .map_err(|_| GatewayError::ConnectionClosed)
    }

    /// Send the authentication handshake frame
    pub async fn authenticate(&self, token: impl Into<String>) -> GatewayResult<()> {
        self.send(ClientFrame::Authenticate {
            token: token.into(),
        })
        .await
    }

    /// Await the next inbound frame, decoded
    ///
    /// Non-text socket messages are skipped; a close from the peer tears
    /// the transport down and surfaces `ConnectionClosed`.
    pub async fn receive(&mut self) -> GatewayResult<ServerFrame> {
        loop {
            if self.stalled.load(Ordering::SeqCst) {
                self.close().await;
                return Err(GatewayError::KeepAliveStalled);
            }

            let message = {
                let open = self.state.as_mut().ok_or(GatewayError::ConnectionClosed)?;
                open.reader.next().await
            };

            match message {
                Some(Ok(WsMessage::Text(text))) => {
                    tracing::trace!(len = text.len(), "Frame received");
                    return ServerFrame::from_json(&text).map_err(|e| {
                        ProtocolError::MalformedFrame(e.to_string()).into()
                    });
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    tracing::info!("Gateway closed by peer");
                    self.close().await;
                    return Err(GatewayError::ConnectionClosed);
                }
                Some(Ok(_)) => {
                    // binary and socket-level ping/pong frames carry no events
                    continue;
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Socket read failed");
                    self.close().await;
                    return Err(GatewayError::ConnectionClosed);
                }
            }
        }
    }

    /// Close the link and stop the keep-alive scheduler
    ///
    /// Idempotent; no ticks fire after this returns.
    pub async fn close(&mut self) {
        if let Some(open) = self.state.take() {
            open.keepalive.shutdown().await;
            drop(open.outbound);
            let _ = open.writer.await;
            tracing::info!("Gateway connection closed");
        }
    }
}

impl std::fmt::Debug for GatewayTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayTransport")
            .field("open", &self.is_open())
            .field("stalled", &self.stalled.load(Ordering::SeqCst))
            .finish()
    }
}

/// Writer task: sole owner of the sink, drains the outbound queue
async fn write_loop(
    mut sink: SplitSink<WsStream, WsMessage>,
    mut rx: mpsc::Receiver<ClientFrame>,
) {
    while let Some(frame) = rx.recv().await {
        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound frame");
                continue;
            }
        };
        if let Err(e) = sink.send(WsMessage::Text(text)).await {
            tracing::warn!(error = %e, "Outbound write failed, stopping writer");
            break;
        }
    }
    let _ = sink.close().await;
}
