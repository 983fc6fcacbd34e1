/// WebSocket transport for backend event channels
///
/// Connects to the backend's event endpoint, subscribes to one named channel
/// and forwards that channel's payloads as [`AgentEvent`]s.
use async_trait::async_trait;
use cowork_core::{AgentEvent, EventChannel, GatewayError, GatewayResult};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

/// Messages sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    Pong { timestamp: Option<i64> },
}

/// Messages received from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Subscribed { channel: String },
    Event { channel: String, payload: Value },
    Ping { timestamp: Option<i64> },
    Error { code: i64, message: String },
}

/// What to do with one decoded text frame
#[derive(Debug, PartialEq)]
enum FrameAction {
    Deliver(AgentEvent),
    Reply(ClientMessage),
    Skip,
}

fn handle_frame(channel: &str, text: &str) -> FrameAction {
    let message = match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to parse server message: {}", e);
            return FrameAction::Skip;
        }
    };

    match message {
        ServerMessage::Event {
            channel: from,
            payload,
        } if from == channel => match serde_json::from_value::<AgentEvent>(payload) {
            Ok(event) => FrameAction::Deliver(event),
            Err(e) => {
                warn!("Dropping malformed event on {}: {}", channel, e);
                FrameAction::Skip
            }
        },
        ServerMessage::Event { channel: from, .. } => {
            debug!("Ignoring event for channel {}", from);
            FrameAction::Skip
        }
        ServerMessage::Subscribed { channel } => {
            info!("Subscription confirmed: {}", channel);
            FrameAction::Skip
        }
        ServerMessage::Ping { timestamp } => FrameAction::Reply(ClientMessage::Pong { timestamp }),
        ServerMessage::Error { code, message } => {
            error!("Server error {}: {}", code, message);
            FrameAction::Skip
        }
    }
}

/// Why one WebSocket session ended
#[derive(Debug)]
enum SessionEnd {
    /// The feed receiver was dropped; leave for good
    SubscriberGone,
    /// The connection went away; reconnect
    Dropped(String),
}

/// Event channel source backed by the backend's WebSocket endpoint.
///
/// A dropped connection is re-established and re-subscribed, up to
/// `max_reconnect_attempts` consecutive failures (negative for no limit).
/// When it gives up, the feed ends.
#[derive(Debug, Clone)]
pub struct WsEventChannel {
    url: String,
    max_reconnect_attempts: i32,
    reconnect_delay: Duration,
}

impl WsEventChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(1),
        }
    }

    pub fn with_reconnect(mut self, max_attempts: i32, delay: Duration) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.reconnect_delay = delay;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connect(&self, channel: &str) -> GatewayResult<WsStream> {
        info!("Connecting to event stream at {}", self.url);

        let (mut ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        let subscribe = serde_json::to_string(&ClientMessage::Subscribe {
            channel: channel.to_string(),
        })?;
        ws.send(WsMessage::Text(subscribe))
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        Ok(ws)
    }

    /// Reconnect after a drop. `None` once attempts are exhausted or the
    /// subscriber went away meanwhile.
    async fn reconnect(
        &self,
        channel: &str,
        tx: &mpsc::UnboundedSender<AgentEvent>,
    ) -> Option<WsStream> {
        let mut attempts = 0;

        loop {
            if self.max_reconnect_attempts >= 0 && attempts >= self.max_reconnect_attempts {
                error!(
                    "Maximum reconnection attempts ({}) exceeded for {}",
                    self.max_reconnect_attempts, channel
                );
                return None;
            }
            attempts += 1;

            warn!(
                "Reconnecting to {} in {:?} (attempt {})...",
                channel, self.reconnect_delay, attempts
            );
            tokio::select! {
                _ = tx.closed() => return None,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }

            match self.connect(channel).await {
                Ok(ws) => {
                    info!("Event stream for {} re-established", channel);
                    return Some(ws);
                }
                Err(e) => error!("Failed to reconnect event stream: {}", e),
            }
        }
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Pump one connection into `tx` until it drops or the subscriber leaves.
async fn run_session(
    ws: WsStream,
    channel: &str,
    tx: &mpsc::UnboundedSender<AgentEvent>,
) -> SessionEnd {
    let (mut ws_sink, mut ws_stream) = ws.split();

    loop {
        tokio::select! {
            _ = tx.closed() => {
                debug!("Subscriber dropped, leaving {}", channel);
                if let Ok(json) = serde_json::to_string(&ClientMessage::Unsubscribe {
                    channel: channel.to_string(),
                }) {
                    let _ = ws_sink.send(WsMessage::Text(json)).await;
                }
                let _ = ws_sink.close().await;
                return SessionEnd::SubscriberGone;
            }
            frame = ws_stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match handle_frame(channel, &text) {
                    FrameAction::Deliver(event) => {
                        if tx.send(event).is_err() {
                            return SessionEnd::SubscriberGone;
                        }
                    }
                    FrameAction::Reply(reply) => {
                        let json = match serde_json::to_string(&reply) {
                            Ok(json) => json,
                            Err(e) => {
                                error!("Failed to encode reply: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = ws_sink.send(WsMessage::Text(json)).await {
                            return SessionEnd::Dropped(format!("failed to send pong: {}", e));
                        }
                    }
                    FrameAction::Skip => {}
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    return SessionEnd::Dropped("server closed event stream".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Dropped(format!("WebSocket error: {}", e)),
            },
        }
    }
}

#[async_trait]
impl EventChannel for WsEventChannel {
    async fn open(&self, channel: &str) -> GatewayResult<mpsc::UnboundedReceiver<AgentEvent>> {
        // The first connection fails fast; later drops are retried
        let ws = self.connect(channel).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let source = self.clone();
        let channel = channel.to_string();

        tokio::spawn(async move {
            let mut ws = ws;
            loop {
                match run_session(ws, &channel, &tx).await {
                    SessionEnd::SubscriberGone => break,
                    SessionEnd::Dropped(reason) => {
                        warn!("Event stream for {} dropped: {}", channel, reason);
                        match source.reconnect(&channel, &tx).await {
                            Some(next) => ws = next,
                            None => break,
                        }
                    }
                }
            }
            // Dropping `tx` ends the feed
            info!("Event stream reader for {} ended", channel);
        });

        Ok(rx)
    }
}
