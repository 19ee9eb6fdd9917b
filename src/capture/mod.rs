//! Speech capture: microphone to streaming transcript to buffered answer
//!
//! One capture activation is one `start()`/`stop()` cycle. The service
//! fetches a fresh token, opens a dedicated recording stream and a streaming
//! transcription session, buffers finalized fragments, and on `stop()` flushes
//! at most one answer onto the protocol socket.

mod buffer;
mod token;
mod transcription;

pub use buffer::TranscriptBuffer;
pub use token::{HttpTokenSource, TokenSource};
pub use transcription::{TranscriptEvent, TranscriptionProvider, TranscriptionSession, WsTranscription};

use crate::error::SessionResult;
use crate::media::{MediaCapabilities, MediaStream};
use crate::protocol::ClientMessage;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Out-of-band notice from the capture pumps to the session dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureNotice {
    /// The transcription session failed mid-stream. Capture must be aborted;
    /// fragments finalized before the failure stay flushable.
    TranscriptionError(String),
}

struct ActiveCapture {
    recording: MediaStream,
    audio_pump: JoinHandle<()>,
    event_pump: JoinHandle<()>,
}

pub struct SpeechCaptureService {
    tokens: Arc<dyn TokenSource>,
    provider: Arc<dyn TranscriptionProvider>,
    media: Arc<dyn MediaCapabilities>,
    outbound: mpsc::Sender<ClientMessage>,
    buffer: Arc<Mutex<TranscriptBuffer>>,
    interim_tx: watch::Sender<String>,
    notice_tx: mpsc::Sender<CaptureNotice>,
    active: Option<ActiveCapture>,
}

impl SpeechCaptureService {
    /// Build the service together with the notice channel the session
    /// dispatcher selects on.
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        provider: Arc<dyn TranscriptionProvider>,
        media: Arc<dyn MediaCapabilities>,
        outbound: mpsc::Sender<ClientMessage>,
    ) -> (Self, mpsc::Receiver<CaptureNotice>) {
        let (notice_tx, notice_rx) = mpsc::channel(8);
        let (interim_tx, _) = watch::channel(String::new());
        (
            Self {
                tokens,
                provider,
                media,
                outbound,
                buffer: Arc::new(Mutex::new(TranscriptBuffer::new())),
                interim_tx,
                notice_tx,
                active: None,
            },
            notice_rx,
        )
    }

    pub fn is_listening(&self) -> bool {
        self.active.is_some()
    }

    /// Whether finalized fragments are waiting to be flushed. Can be true
    /// after a mid-stream abort even though listening already stopped.
    pub fn has_buffered(&self) -> bool {
        self.buffer.lock().map(|b| !b.is_empty()).unwrap_or(false)
    }

    /// Interim transcript feed for UI feedback. Never buffered.
    pub fn interim(&self) -> watch::Receiver<String> {
        self.interim_tx.subscribe()
    }

    /// Begin a capture activation. The caller gates on socket state and
    /// playback; this only guards against double starts.
    pub async fn start(&mut self) -> SessionResult<()> {
        if self.active.is_some() {
            warn!("capture already listening");
            return Ok(());
        }

        // Encoding support is checked by the provider before any network
        // handshake happens.
        let mut recording = self.media.open_recording_stream().await?;

        let token = match self.tokens.fetch().await {
            Ok(token) => token,
            Err(e) => {
                recording.stream.release();
                return Err(e);
            }
        };

        let session = match self.provider.open(&token).await {
            Ok(session) => session,
            Err(e) => {
                recording.stream.release();
                return Err(e);
            }
        };

        let mut chunks = recording.chunks;
        let audio_tx = session.audio_tx;
        let audio_pump = tokio::spawn(async move {
            while let Some(pcm) = chunks.recv().await {
                if audio_tx.send(pcm).await.is_err() {
                    break;
                }
            }
        });

        let mut events = session.events;
        let buffer = Arc::clone(&self.buffer);
        let interim_tx = self.interim_tx.clone();
        let notice_tx = self.notice_tx.clone();
        let event_pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    TranscriptEvent::Final(text) => {
                        if let Ok(mut buffer) = buffer.lock() {
                            buffer.push_final(text);
                        }
                        interim_tx.send_replace(String::new());
                    }
                    TranscriptEvent::Interim(text) => {
                        interim_tx.send_replace(text);
                    }
                    TranscriptEvent::Error(message) => {
                        let _ = notice_tx
                            .send(CaptureNotice::TranscriptionError(message))
                            .await;
                        return;
                    }
                }
            }
        });

        info!("capture activation started");
        self.active = Some(ActiveCapture {
            recording: recording.stream,
            audio_pump,
            event_pump,
        });
        Ok(())
    }

    /// End the activation and flush the buffer. Sends exactly one `Answer`
    /// when anything was captured; returns the flushed text either way so
    /// the caller can surface a "no speech" notice on `None`.
    pub async fn stop(&mut self) -> Option<String> {
        self.shutdown_active();

        let answer = self
            .buffer
            .lock()
            .ok()
            .and_then(|mut buffer| buffer.flush());

        if let Some(text) = &answer {
            info!("sending answer ({} chars)", text.len());
            if self.outbound.send(ClientMessage::Answer { text: text.clone() }).await.is_err() {
                warn!("answer dropped: protocol socket already closed");
            }
        }
        answer
    }

    /// Abort after a mid-stream transcription failure: tear the session
    /// down but keep finalized fragments flushable by a later `stop()`.
    pub fn abort(&mut self) {
        self.shutdown_active();
    }

    /// Discard the activation and everything buffered. Used at teardown.
    pub fn cancel(&mut self) {
        self.shutdown_active();
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
    }

    fn shutdown_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            // Aborting the audio pump drops the session's audio sender,
            // which terminates the provider session; no chunk is delivered
            // after this returns.
            active.audio_pump.abort();
            active.event_pump.abort();
            active.recording.release();
            self.interim_tx.send_replace(String::new());
            info!("capture activation ended");
        }
    }
}
