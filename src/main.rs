use anyhow::{Context, Result};
use candor_interview::{
    Config, ElevenLabsTts, HeadlessCapabilities, HttpTokenSource, LogSynthesis, NullAudioSink,
    SessionController, SessionDeps, SetupOrchestrator, SpeechPlaybackService, Voice, WsTranscription,
    WsTransport,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

/// Headless interview session client: runs the full setup and live session
/// loop against an interview backend from the terminal.
#[derive(Parser, Debug)]
#[command(name = "candor-interview", version)]
struct Args {
    /// Config file (without extension), e.g. config/candor-interview
    #[arg(long, default_value = "config/candor-interview")]
    config: String,

    /// Job profile identifier
    #[arg(long)]
    job_id: String,

    /// Candidate resume identifier
    #[arg(long)]
    resume_id: String,

    /// Override the interviewer voice
    #[arg(long)]
    voice_id: Option<String>,

    /// Streaming transcription endpoint
    #[arg(long, default_value = "wss://api.assemblyai.com/v2/realtime/ws")]
    stt_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let api_key = std::env::var("TTS_API_KEY").unwrap_or_default();
    let tts = ElevenLabsTts::new(cfg.tts.base_url.clone(), api_key)?;
    let playback = Arc::new(SpeechPlaybackService::new(
        Arc::new(tts),
        Arc::new(NullAudioSink),
        Arc::new(LogSynthesis),
        cfg.tts.settings.clone(),
    ));

    let media = Arc::new(HeadlessCapabilities::new());
    let voice_id = args.voice_id.unwrap_or_else(|| cfg.tts.default_voice_id.clone());
    let voice = Voice::new(voice_id, "interviewer");

    let mut setup = SetupOrchestrator::new(media.clone(), playback.clone(), voice.clone());
    setup
        .request_permissions()
        .await
        .context("permission step failed")?;
    setup.select_voice(voice);
    setup
        .start_screen_share()
        .await
        .context("screen share step failed")?;
    let resources = setup.complete_setup().await.context("setup did not complete")?;

    let deps = SessionDeps {
        transport: Arc::new(WsTransport::new(cfg.backend.ws_url.clone())),
        media,
        playback,
        tokens: Arc::new(HttpTokenSource::new(cfg.backend.token_url.clone())),
        transcription: Arc::new(WsTranscription::new(args.stt_url)),
        limits: cfg.session.clone(),
    };

    let session = SessionController::activate(&args.job_id, &args.resume_id, resources, deps)
        .await
        .context("failed to activate session")?;

    let handle = session.handle.clone();
    let mut watch = handle.watch();
    tokio::spawn(async move {
        while watch.changed().await.is_ok() {
            let snapshot = watch.borrow().clone();
            info!(
                "phase={} progress={} remaining={}s",
                snapshot.phase,
                snapshot.progress(),
                snapshot.remaining_seconds
            );
            if let Some(notice) = snapshot.notice {
                info!("{}", notice);
            }
            if let Some(error) = snapshot.last_error {
                info!("error: {}", error);
            }
        }
    });

    let mut interim = handle.interim();
    tokio::spawn(async move {
        while interim.changed().await.is_ok() {
            let text = interim.borrow().clone();
            if !text.is_empty() {
                info!("transcribing: {}", text);
            }
        }
    });

    let mut done = session.done;
    tokio::select! {
        result = &mut done => {
            let phase = result.context("session task failed")?;
            info!("session finished: {}", phase);
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, ending interview");
            handle.end_interview().await;
        }
    }

    let phase = done.await.context("session task failed")?;
    info!("session finished: {}", phase);
    Ok(())
}
