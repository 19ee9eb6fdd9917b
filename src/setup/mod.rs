//! Pre-session setup checklist
//!
//! Drives the finite sequence `Permissions -> VoiceSelection -> ScreenShare
//! -> Ready`. Each step consumes one external capability; a denied step
//! halts there until it is re-invoked. Completing setup hands the granted
//! streams to the session controller as one `SessionResources` bundle, which
//! is what makes the controller the sole owner of media lifetime.

use crate::error::{SessionError, SessionResult};
use crate::media::{MediaCapabilities, MediaStream, ScreenShareGrant};
use crate::playback::{SpeechPlaybackService, Voice};
use crate::session::SessionPhase;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

const VOICE_TEST_PHRASE: &str =
    "Hello! This is how your interviewer will sound. Good luck today.";

/// Everything the controller needs to go live: the granted streams, the
/// screen-share end signal, and the selected voice.
#[derive(Debug)]
pub struct SessionResources {
    pub camera: MediaStream,
    pub microphone: MediaStream,
    pub screen: MediaStream,
    pub share_ended: oneshot::Receiver<()>,
    pub voice: Voice,
}

pub struct SetupOrchestrator {
    media: Arc<dyn MediaCapabilities>,
    playback: Arc<SpeechPlaybackService>,
    phase: SessionPhase,
    camera: Option<MediaStream>,
    microphone: Option<MediaStream>,
    screen: Option<ScreenShareGrant>,
    voice: Voice,
}

impl SetupOrchestrator {
    pub fn new(
        media: Arc<dyn MediaCapabilities>,
        playback: Arc<SpeechPlaybackService>,
        default_voice: Voice,
    ) -> Self {
        Self {
            media,
            playback,
            phase: SessionPhase::Permissions,
            camera: None,
            microphone: None,
            screen: None,
            voice: default_voice,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn camera_granted(&self) -> bool {
        self.camera.is_some()
    }

    pub fn microphone_granted(&self) -> bool {
        self.microphone.is_some()
    }

    pub fn screen_share_active(&self) -> bool {
        self.screen.is_some()
    }

    pub fn selected_voice(&self) -> &Voice {
        &self.voice
    }

    /// Request camera then microphone. On denial the step halts where it
    /// is; re-invoking retries from the missing device. On success the
    /// camera feeds the live preview and setup advances to voice selection.
    pub async fn request_permissions(&mut self) -> SessionResult<()> {
        if self.camera.is_none() {
            let camera = self.media.request_camera().await.map_err(|e| {
                warn!("camera permission denied: {}", e);
                SessionError::PermissionDenied(e.to_string())
            })?;
            self.media.attach_preview(&camera);
            self.camera = Some(camera);
        }

        if self.microphone.is_none() {
            let microphone = self.media.request_microphone().await.map_err(|e| {
                warn!("microphone permission denied: {}", e);
                SessionError::PermissionDenied(e.to_string())
            })?;
            self.microphone = Some(microphone);
        }

        info!("camera and microphone granted");
        if self.phase == SessionPhase::Permissions {
            self.phase = SessionPhase::VoiceSelection;
        }
        Ok(())
    }

    /// Pure assignment; no network effect.
    pub fn select_voice(&mut self, voice: Voice) {
        info!("voice selected: {}", voice.label);
        self.voice = voice;
        if self.phase == SessionPhase::VoiceSelection {
            self.phase = SessionPhase::ScreenShare;
        }
    }

    /// Preview a voice with a canned phrase. The active selection is left
    /// untouched; the override lasts exactly one utterance.
    pub async fn test_voice(&self, voice: &Voice) -> SessionResult<()> {
        self.playback.speak(VOICE_TEST_PHRASE, &voice.id).await
    }

    /// Request a screen-capture stream. The grant's end-of-stream signal is
    /// carried into `SessionResources` so the controller can react if the
    /// user stops sharing mid-session.
    pub async fn start_screen_share(&mut self) -> SessionResult<()> {
        let grant = self.media.request_screen_share().await.map_err(|e| {
            warn!("screen share denied: {}", e);
            SessionError::ScreenShareDenied(e.to_string())
        })?;
        self.screen = Some(grant);
        info!("screen share active");
        if self.phase == SessionPhase::ScreenShare {
            self.phase = SessionPhase::Ready;
        }
        Ok(())
    }

    /// Finish setup: requires camera, microphone and an active screen share,
    /// then requests fullscreen. Only when fullscreen succeeds are the
    /// granted streams handed over; any failure leaves setup (and every
    /// stream) exactly where it was.
    pub async fn complete_setup(&mut self) -> SessionResult<SessionResources> {
        if self.camera.is_none() || self.microphone.is_none() {
            return Err(SessionError::PermissionDenied(
                "camera and microphone are required before starting".to_string(),
            ));
        }
        if self.screen.is_none() {
            return Err(SessionError::ScreenShareDenied(
                "screen sharing is required before starting".to_string(),
            ));
        }

        self.media
            .enter_fullscreen()
            .await
            .map_err(|e| SessionError::Fullscreen(e.to_string()))?;

        // Preconditions checked above; the takes cannot fail.
        let camera = self.camera.take().expect("camera checked");
        let microphone = self.microphone.take().expect("microphone checked");
        let grant = self.screen.take().expect("screen share checked");

        info!("setup complete, session ready to activate");
        Ok(SessionResources {
            camera,
            microphone,
            screen: grant.stream,
            share_ended: grant.ended,
            voice: self.voice.clone(),
        })
    }
}
