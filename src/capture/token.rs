use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use serde::Deserialize;

/// Source of short-lived transcription tokens. Tokens are single-use per
/// capture activation and never cached.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self) -> SessionResult<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    error: Option<String>,
}

/// Fetches tokens from the backend's token endpoint with a plain GET.
pub struct HttpTokenSource {
    http: reqwest::Client,
    url: String,
}

impl HttpTokenSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch(&self) -> SessionResult<String> {
        let response: TokenResponse = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(SessionError::Token(error));
        }
        response
            .token
            .ok_or_else(|| SessionError::Token("token endpoint returned no token".to_string()))
    }
}
