pub mod capture;
pub mod config;
pub mod error;
pub mod integrity;
pub mod media;
pub mod playback;
pub mod protocol;
pub mod session;
pub mod setup;
pub mod timer;

pub use capture::{
    CaptureNotice, HttpTokenSource, SpeechCaptureService, TokenSource, TranscriptBuffer,
    TranscriptEvent, TranscriptionProvider, TranscriptionSession, WsTranscription,
};
pub use config::{BackendConfig, Config, SessionLimits, TtsConfig};
pub use error::{SessionError, SessionResult};
pub use integrity::{Escalation, IntegrityMonitor, ViolationCounter};
pub use media::{
    HeadlessCapabilities, MediaCapabilities, MediaKind, MediaResources, MediaStream,
    RecordingStream, ScreenShareGrant, VisibilityState,
};
pub use playback::{
    AudioSink, ElevenLabsTts, LocalSynthesis, LogSynthesis, NullAudioSink, SpeechPlaybackService,
    TtsProvider, Voice, VoiceSettings,
};
pub use protocol::{
    ClientMessage, ProtocolConnection, ProtocolTransport, ScreenShareAction, ServerMessage,
    SocketEvent, WsTransport,
};
pub use session::{
    ActiveSession, EndReason, SessionController, SessionDeps, SessionHandle, SessionPhase,
    SessionSnapshot, UserCommand,
};
pub use setup::{SessionResources, SetupOrchestrator};
pub use timer::{SessionTimer, TickOutcome};
