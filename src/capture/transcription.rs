use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

/// Event emitted by a streaming transcription session.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    /// Non-final fragment, shown for feedback but never buffered.
    Interim(String),
    /// Finalized fragment, appended to the transcript buffer.
    Final(String),
    /// Provider-side failure; capture aborts but keeps finalized fragments.
    Error(String),
}

/// An open streaming transcription session. Audio chunks go in through
/// `audio_tx`; transcript events come out of `events`. Dropping `audio_tx`
/// terminates the session on the provider side.
pub struct TranscriptionSession {
    pub audio_tx: mpsc::Sender<Vec<u8>>,
    pub events: mpsc::Receiver<TranscriptEvent>,
}

/// Provider able to open a streaming transcription session authorized by a
/// fresh token.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn open(&self, token: &str) -> SessionResult<TranscriptionSession>;
}

#[derive(Debug, Serialize)]
struct AudioChunkFrame {
    audio_data: String, // Base64-encoded PCM bytes
}

#[derive(Debug, Serialize)]
struct TerminateFrame {
    terminate_session: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptFrame {
    message_type: Option<String>,
    text: Option<String>,
    error: Option<String>,
}

/// WebSocket transcription provider speaking the realtime STT dialect:
/// base64 PCM frames in, partial/final transcript frames out.
pub struct WsTranscription {
    endpoint: String,
}

impl WsTranscription {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for WsTranscription {
    async fn open(&self, token: &str) -> SessionResult<TranscriptionSession> {
        let url = format!("{}?token={}", self.endpoint, token);
        info!("Opening transcription session");

        let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| SessionError::TranscriptionUnavailable(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (audio_tx, mut audio_rx) = mpsc::channel::<Vec<u8>>(32);
        let (event_tx, event_rx) = mpsc::channel::<TranscriptEvent>(32);

        tokio::spawn(async move {
            while let Some(pcm) = audio_rx.recv().await {
                let frame = AudioChunkFrame {
                    audio_data: base64::engine::general_purpose::STANDARD.encode(&pcm),
                };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("failed to serialize audio frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    error!("failed to send audio frame: {}", e);
                    break;
                }
            }
            // Capture stopped: ask the provider to finalize, then close.
            if let Ok(text) = serde_json::to_string(&TerminateFrame {
                terminate_session: true,
            }) {
                let _ = write.send(Message::Text(text.into())).await;
            }
            let _ = write.send(Message::Close(None)).await;
        });

        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        let _ = event_tx.send(TranscriptEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                let Message::Text(text) = message else {
                    continue;
                };
                let frame: TranscriptFrame = match serde_json::from_str(text.as_ref()) {
                    Ok(frame) => frame,
                    Err(e) => {
                        debug!("ignoring unparseable transcript frame: {}", e);
                        continue;
                    }
                };
                if let Some(error) = frame.error {
                    let _ = event_tx.send(TranscriptEvent::Error(error)).await;
                    return;
                }
                let text = frame.text.unwrap_or_default();
                if text.is_empty() {
                    continue;
                }
                let event = match frame.message_type.as_deref() {
                    Some("FinalTranscript") => TranscriptEvent::Final(text),
                    Some("PartialTranscript") => TranscriptEvent::Interim(text),
                    _ => continue,
                };
                if event_tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        Ok(TranscriptionSession {
            audio_tx,
            events: event_rx,
        })
    }
}
