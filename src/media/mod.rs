//! Media capability seam
//!
//! The runtime supplies camera/microphone acquisition, screen capture,
//! fullscreen control, and visibility notifications through the
//! `MediaCapabilities` trait. The session controller is the single owner of
//! every granted stream: consumers receive references and never release
//! tracks themselves.

mod headless;

pub use headless::HeadlessCapabilities;

use crate::error::SessionResult;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// What a granted media stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Camera,
    Microphone,
    ScreenShare,
    /// Dedicated recording stream opened per capture activation, separate
    /// from the preview microphone to avoid device contention.
    Recording,
}

/// Handle to a granted stream. Releasing stops the underlying tracks;
/// release is idempotent and only ever fires once.
#[derive(Debug)]
pub struct MediaStream {
    id: Uuid,
    kind: MediaKind,
    releaser: Option<oneshot::Sender<MediaKind>>,
}

impl MediaStream {
    /// Create a stream handle plus the signal its provider uses to observe
    /// the release.
    pub fn new(kind: MediaKind) -> (Self, oneshot::Receiver<MediaKind>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                id: Uuid::new_v4(),
                kind,
                releaser: Some(tx),
            },
            rx,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Stop the underlying tracks. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(tx) = self.releaser.take() {
            let _ = tx.send(self.kind);
        }
    }

    pub fn is_released(&self) -> bool {
        self.releaser.is_none()
    }
}

/// The streams a live session owns. Acquired during setup, released exactly
/// once at teardown; consumers only ever borrow them.
#[derive(Debug)]
pub struct MediaResources {
    pub camera: MediaStream,
    pub microphone: MediaStream,
    pub screen: MediaStream,
}

impl MediaResources {
    /// Stop every owned track. Idempotent per stream.
    pub fn release_all(&mut self) {
        self.camera.release();
        self.microphone.release();
        self.screen.release();
    }
}

/// Document visibility as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Visible,
    Hidden,
}

/// A granted screen share plus the one-shot signal that fires if the user
/// stops sharing from the runtime chrome.
pub struct ScreenShareGrant {
    pub stream: MediaStream,
    pub ended: oneshot::Receiver<()>,
}

/// A recording-capable audio stream delivering raw PCM chunks. The chunk
/// channel closes when capture stops on the provider side.
pub struct RecordingStream {
    pub stream: MediaStream,
    pub chunks: mpsc::Receiver<Vec<u8>>,
}

/// Narrow contract over the runtime's media facilities.
#[async_trait]
pub trait MediaCapabilities: Send + Sync {
    /// Request camera access; the returned stream feeds the live preview.
    async fn request_camera(&self) -> SessionResult<MediaStream>;

    /// Request microphone access for the preview/level meter.
    async fn request_microphone(&self) -> SessionResult<MediaStream>;

    /// Request a screen-capture stream.
    async fn request_screen_share(&self) -> SessionResult<ScreenShareGrant>;

    /// Open the dedicated recording stream used by speech capture. Fails
    /// with `TranscriptionUnavailable` when no supported audio encoding
    /// exists on the device.
    async fn open_recording_stream(&self) -> SessionResult<RecordingStream>;

    /// Attach the camera stream to the live preview surface.
    fn attach_preview(&self, stream: &MediaStream);

    async fn enter_fullscreen(&self) -> SessionResult<()>;

    async fn exit_fullscreen(&self);

    /// Subscribe to visibility changes. The subscription lives until the
    /// receiver is dropped.
    fn watch_visibility(&self) -> mpsc::Receiver<VisibilityState>;

    /// Subscribe to fullscreen changes; payload is whether the document is
    /// fullscreen after the change.
    fn watch_fullscreen(&self) -> mpsc::Receiver<bool>;
}
