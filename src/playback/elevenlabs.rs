use super::{TtsProvider, VoiceSettings};
use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// ElevenLabs-compatible TTS provider: POSTs text plus voice settings and
/// receives raw audio bytes.
pub struct ElevenLabsTts {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ElevenLabsTts {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> SessionResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(SessionError::Http)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TtsProvider for ElevenLabsTts {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> SessionResult<Vec<u8>> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            voice_id
        );

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&SynthesisRequest {
                text,
                voice_settings: settings,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}
