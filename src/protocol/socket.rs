use super::messages::{ClientMessage, ServerMessage};
use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Event surfaced by the protocol socket reader.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Message(ServerMessage),
    /// The socket closed; `normal` is true only for a clean close code.
    Closed { normal: bool },
}

/// A live connection to the interview backend. Dropping `outbound` closes the
/// socket with a normal code.
pub struct ProtocolConnection {
    pub outbound: mpsc::Sender<ClientMessage>,
    pub inbound: mpsc::Receiver<SocketEvent>,
}

impl ProtocolConnection {
    /// Build a connection directly from channel halves. Used by transports
    /// and by scripted test doubles.
    pub fn from_channels(
        outbound: mpsc::Sender<ClientMessage>,
        inbound: mpsc::Receiver<SocketEvent>,
    ) -> Self {
        Self { outbound, inbound }
    }
}

/// Transport capable of opening the interview protocol socket for a given
/// job/candidate pair.
#[async_trait]
pub trait ProtocolTransport: Send + Sync {
    async fn connect(&self, job_id: &str, resume_id: &str) -> SessionResult<ProtocolConnection>;
}

/// WebSocket transport speaking JSON text frames to the backend at
/// `/ws/interview/{job_id}/{resume_id}`.
pub struct WsTransport {
    base_url: String,
    capacity: usize,
}

impl WsTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            capacity: 64,
        }
    }
}

#[async_trait]
impl ProtocolTransport for WsTransport {
    async fn connect(&self, job_id: &str, resume_id: &str) -> SessionResult<ProtocolConnection> {
        let url = format!(
            "{}/ws/interview/{}/{}",
            self.base_url.trim_end_matches('/'),
            job_id,
            resume_id
        );
        info!("Connecting to interview backend at {}", url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| SessionError::ConnectionLost(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::channel::<ClientMessage>(self.capacity);
        let (in_tx, in_rx) = mpsc::channel::<SocketEvent>(self.capacity);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match serde_json::to_string(&msg) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            error!("failed to send protocol frame: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("failed to serialize protocol frame: {}", e),
                }
            }
            // All senders dropped: close cleanly.
            let _ = write
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "".into(),
                })))
                .await;
        });

        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        error!("failed to read protocol frame: {}", e);
                        let _ = in_tx.send(SocketEvent::Closed { normal: false }).await;
                        return;
                    }
                };
                match message {
                    Message::Text(text) => {
                        let parsed = ServerMessage::parse(text.as_ref());
                        debug!("received protocol frame: {:?}", parsed);
                        if in_tx.send(SocketEvent::Message(parsed)).await.is_err() {
                            return;
                        }
                    }
                    Message::Close(frame) => {
                        let normal = matches!(
                            frame,
                            Some(CloseFrame {
                                code: CloseCode::Normal,
                                ..
                            })
                        );
                        info!("protocol socket closed (normal={})", normal);
                        let _ = in_tx.send(SocketEvent::Closed { normal }).await;
                        return;
                    }
                    Message::Binary(bin) => {
                        warn!("unexpected binary frame ({} bytes)", bin.len());
                    }
                    _ => {}
                }
            }
            // Stream ended without a close frame.
            let _ = in_tx.send(SocketEvent::Closed { normal: false }).await;
        });

        Ok(ProtocolConnection::from_channels(out_tx, in_rx))
    }
}
