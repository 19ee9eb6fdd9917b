use super::{
    MediaCapabilities, MediaKind, MediaStream, RecordingStream, ScreenShareGrant, VisibilityState,
};
use crate::error::SessionResult;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Capability provider for running the session loop without a browser
/// runtime: every grant succeeds, fullscreen is a no-op, and visibility
/// never changes. The recording stream emits silence at a steady cadence so
/// the capture path can be exercised end to end.
pub struct HeadlessCapabilities {
    // Held so the watch channels stay open for the session's lifetime.
    visibility_tx: Mutex<Vec<mpsc::Sender<VisibilityState>>>,
    fullscreen_tx: Mutex<Vec<mpsc::Sender<bool>>>,
}

impl HeadlessCapabilities {
    pub fn new() -> Self {
        Self {
            visibility_tx: Mutex::new(Vec::new()),
            fullscreen_tx: Mutex::new(Vec::new()),
        }
    }
}

impl Default for HeadlessCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

fn granted(kind: MediaKind) -> MediaStream {
    let (stream, release_rx) = MediaStream::new(kind);
    tokio::spawn(async move {
        if let Ok(kind) = release_rx.await {
            info!("released {:?} stream", kind);
        }
    });
    stream
}

#[async_trait]
impl MediaCapabilities for HeadlessCapabilities {
    async fn request_camera(&self) -> SessionResult<MediaStream> {
        Ok(granted(MediaKind::Camera))
    }

    async fn request_microphone(&self) -> SessionResult<MediaStream> {
        Ok(granted(MediaKind::Microphone))
    }

    async fn request_screen_share(&self) -> SessionResult<ScreenShareGrant> {
        // The ended signal never fires headlessly; keep the sender alive by
        // leaking it into a task that waits forever.
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        Ok(ScreenShareGrant {
            stream: granted(MediaKind::ScreenShare),
            ended: rx,
        })
    }

    async fn open_recording_stream(&self) -> SessionResult<RecordingStream> {
        let (stream, mut release_rx) = MediaStream::new(MediaKind::Recording);
        let (chunk_tx, chunk_rx) = mpsc::channel(16);
        tokio::spawn(async move {
            // 100ms of 16kHz mono 16-bit silence per chunk.
            let silence = vec![0u8; 3200];
            let mut ticker = tokio::time::interval(Duration::from_millis(100));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if chunk_tx.send(silence.clone()).await.is_err() {
                            break;
                        }
                    }
                    _ = &mut release_rx => break,
                }
            }
        });
        Ok(RecordingStream {
            stream,
            chunks: chunk_rx,
        })
    }

    fn attach_preview(&self, stream: &MediaStream) {
        info!("preview attached to stream {}", stream.id());
    }

    async fn enter_fullscreen(&self) -> SessionResult<()> {
        Ok(())
    }

    async fn exit_fullscreen(&self) {}

    fn watch_visibility(&self) -> mpsc::Receiver<VisibilityState> {
        let (tx, rx) = mpsc::channel(8);
        self.visibility_tx.lock().unwrap().push(tx);
        rx
    }

    fn watch_fullscreen(&self) -> mpsc::Receiver<bool> {
        let (tx, rx) = mpsc::channel(8);
        self.fullscreen_tx.lock().unwrap().push(tx);
        rx
    }
}
