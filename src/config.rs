use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionLimits,
    pub tts: TtsConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// WebSocket base URL of the interview backend (e.g. "ws://localhost:8000")
    pub ws_url: String,
    /// Endpoint returning a fresh transcription token per capture activation
    pub token_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionLimits {
    /// Fixed interview time budget in seconds
    pub time_budget_secs: u32,
    /// Tab switches tolerated before forced termination
    pub tab_switch_threshold: u32,
    /// Fullscreen exits tolerated before forced termination
    pub fullscreen_exit_threshold: u32,
    /// Delay before the automatic fullscreen re-entry attempt, in milliseconds
    pub fullscreen_reentry_delay_ms: u64,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            time_budget_secs: 600,
            tab_switch_threshold: 3,
            fullscreen_exit_threshold: 2,
            fullscreen_reentry_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TtsConfig {
    /// Base URL of the external TTS provider
    pub base_url: String,
    /// Voice used when the candidate skips voice selection
    pub default_voice_id: String,
    /// Synthesis settings forwarded with every request
    #[serde(default)]
    pub settings: crate::playback::VoiceSettings,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
