//! Speech playback: render assistant text as audio
//!
//! The external TTS provider is tried first; any failure (network, decode,
//! playback) falls back to the device's local synthesis capability. Only a
//! double failure surfaces as an error.

mod elevenlabs;

pub use elevenlabs::ElevenLabsTts;

use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Synthesis settings forwarded to the external TTS provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// A selectable interviewer voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub label: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// External provider turning text into raw audio bytes.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> SessionResult<Vec<u8>>;
}

/// Plays decoded audio bytes; resolves when playback ends.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: Vec<u8>) -> SessionResult<()>;
}

/// On-device synthesis used whenever the external provider fails.
#[async_trait]
pub trait LocalSynthesis: Send + Sync {
    async fn speak(&self, text: &str) -> SessionResult<()>;
}

/// Sink that discards audio immediately. Used by the headless binary.
pub struct NullAudioSink;

#[async_trait]
impl AudioSink for NullAudioSink {
    async fn play(&self, _audio: Vec<u8>) -> SessionResult<()> {
        Ok(())
    }
}

/// Fallback that logs the utterance instead of speaking. Used headlessly.
pub struct LogSynthesis;

#[async_trait]
impl LocalSynthesis for LogSynthesis {
    async fn speak(&self, text: &str) -> SessionResult<()> {
        info!("local synthesis: {}", text);
        Ok(())
    }
}

pub struct SpeechPlaybackService {
    tts: Arc<dyn TtsProvider>,
    sink: Arc<dyn AudioSink>,
    fallback: Arc<dyn LocalSynthesis>,
    settings: VoiceSettings,
    speaking: AtomicBool,
}

impl SpeechPlaybackService {
    pub fn new(
        tts: Arc<dyn TtsProvider>,
        sink: Arc<dyn AudioSink>,
        fallback: Arc<dyn LocalSynthesis>,
        settings: VoiceSettings,
    ) -> Self {
        Self {
            tts,
            sink,
            fallback,
            settings,
            speaking: AtomicBool::new(false),
        }
    }

    /// Whether an utterance is currently audible. Capture must not start
    /// while this is true.
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Speak `text` with the given voice, resolving when playback ends.
    /// Empty text is a no-op. The session dispatcher processes messages
    /// sequentially, so at most one utterance is ever in flight.
    pub async fn speak(&self, text: &str, voice_id: &str) -> SessionResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        self.speaking.store(true, Ordering::SeqCst);
        let result = self.speak_inner(text, voice_id).await;
        self.speaking.store(false, Ordering::SeqCst);
        result
    }

    async fn speak_inner(&self, text: &str, voice_id: &str) -> SessionResult<()> {
        match self.tts.synthesize(text, voice_id, &self.settings).await {
            Ok(audio) => match self.sink.play(audio).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!("audio playback failed, falling back: {}", e),
            },
            Err(e) => warn!("TTS provider failed, falling back: {}", e),
        }

        self.fallback
            .speak(text)
            .await
            .map_err(|e| SessionError::Playback(format!("provider and local synthesis failed: {}", e)))
    }
}
