//! Error types for the interview session client

use thiserror::Error;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while preparing or running an interview session.
///
/// Setup errors halt the current setup step until the step is re-invoked.
/// Mid-session errors are either absorbed with a fallback (playback) or
/// escalate through the controller's single termination path. None of these
/// tear down the surrounding application.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("camera or microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("screen share denied: {0}")]
    ScreenShareDenied(String),

    #[error("fullscreen entry failed: {0}")]
    Fullscreen(String),

    #[error("connection to interview backend lost: {0}")]
    ConnectionLost(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("speech playback failed: {0}")]
    Playback(String),

    #[error("token endpoint error: {0}")]
    Token(String),

    #[error("media device error: {0}")]
    MediaDevice(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
