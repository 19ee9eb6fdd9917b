#![allow(dead_code)]

// Deterministic scripted doubles for every capability seam, plus a rig that
// drives the real setup orchestrator into an activated session.

use async_trait::async_trait;
use candor_interview::{
    AudioSink, LocalSynthesis, MediaCapabilities, MediaKind, MediaStream, ProtocolConnection,
    ProtocolTransport, RecordingStream, ScreenShareGrant, SessionController, SessionDeps,
    ScreenShareAction, SessionError, SessionHandle, SessionLimits, SessionPhase, SessionResources,
    SessionResult, SessionSnapshot, SetupOrchestrator, SocketEvent, SpeechPlaybackService, TokenSource,
    TranscriptEvent, TranscriptionProvider, TranscriptionSession, TtsProvider, VisibilityState,
    Voice, VoiceSettings,
};
use candor_interview::protocol::ClientMessage;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

pub struct FakeMedia {
    pub deny_camera: Mutex<bool>,
    pub deny_microphone: Mutex<bool>,
    pub deny_screen_share: Mutex<bool>,
    pub fail_fullscreen: Mutex<bool>,
    pub fail_recording: Mutex<bool>,
    pub fullscreen_entries: AtomicU32,
    released_tx: mpsc::UnboundedSender<MediaKind>,
    visibility: Mutex<Vec<mpsc::Sender<VisibilityState>>>,
    fullscreen: Mutex<Vec<mpsc::Sender<bool>>>,
    share_end: Mutex<Option<oneshot::Sender<()>>>,
    recording_chunks: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
}

impl FakeMedia {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MediaKind>) {
        let (released_tx, released_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                deny_camera: Mutex::new(false),
                deny_microphone: Mutex::new(false),
                deny_screen_share: Mutex::new(false),
                fail_fullscreen: Mutex::new(false),
                fail_recording: Mutex::new(false),
                fullscreen_entries: AtomicU32::new(0),
                released_tx,
                visibility: Mutex::new(Vec::new()),
                fullscreen: Mutex::new(Vec::new()),
                share_end: Mutex::new(None),
                recording_chunks: Mutex::new(None),
            }),
            released_rx,
        )
    }

    fn granted(&self, kind: MediaKind) -> MediaStream {
        let (stream, release_rx) = MediaStream::new(kind);
        let tx = self.released_tx.clone();
        tokio::spawn(async move {
            if let Ok(kind) = release_rx.await {
                let _ = tx.send(kind);
            }
        });
        stream
    }

    /// Simulate the candidate hiding the interview tab.
    pub async fn go_hidden(&self) {
        let subscribers = self.visibility.lock().unwrap().clone();
        for tx in subscribers {
            let _ = tx.send(VisibilityState::Hidden).await;
        }
    }

    /// Simulate a fullscreen exit.
    pub async fn leave_fullscreen(&self) {
        let subscribers = self.fullscreen.lock().unwrap().clone();
        for tx in subscribers {
            let _ = tx.send(false).await;
        }
    }

    /// Simulate the candidate stopping the screen share from the chrome.
    pub fn end_share(&self) {
        if let Some(tx) = self.share_end.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }

    /// Push a PCM chunk into the open recording stream.
    pub async fn feed_chunk(&self, pcm: Vec<u8>) {
        let tx = self.recording_chunks.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.send(pcm).await;
        }
    }

    pub fn fullscreen_entry_count(&self) -> u32 {
        self.fullscreen_entries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaCapabilities for FakeMedia {
    async fn request_camera(&self) -> SessionResult<MediaStream> {
        if *self.deny_camera.lock().unwrap() {
            return Err(SessionError::PermissionDenied("camera denied".into()));
        }
        Ok(self.granted(MediaKind::Camera))
    }

    async fn request_microphone(&self) -> SessionResult<MediaStream> {
        if *self.deny_microphone.lock().unwrap() {
            return Err(SessionError::PermissionDenied("microphone denied".into()));
        }
        Ok(self.granted(MediaKind::Microphone))
    }

    async fn request_screen_share(&self) -> SessionResult<ScreenShareGrant> {
        if *self.deny_screen_share.lock().unwrap() {
            return Err(SessionError::ScreenShareDenied("share declined".into()));
        }
        let (tx, rx) = oneshot::channel();
        *self.share_end.lock().unwrap() = Some(tx);
        Ok(ScreenShareGrant {
            stream: self.granted(MediaKind::ScreenShare),
            ended: rx,
        })
    }

    async fn open_recording_stream(&self) -> SessionResult<RecordingStream> {
        if *self.fail_recording.lock().unwrap() {
            return Err(SessionError::TranscriptionUnavailable(
                "no supported audio encoding".into(),
            ));
        }
        let (tx, rx) = mpsc::channel(32);
        *self.recording_chunks.lock().unwrap() = Some(tx);
        Ok(RecordingStream {
            stream: self.granted(MediaKind::Recording),
            chunks: rx,
        })
    }

    fn attach_preview(&self, _stream: &MediaStream) {}

    async fn enter_fullscreen(&self) -> SessionResult<()> {
        if *self.fail_fullscreen.lock().unwrap() {
            return Err(SessionError::Fullscreen("fullscreen rejected".into()));
        }
        self.fullscreen_entries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exit_fullscreen(&self) {}

    fn watch_visibility(&self) -> mpsc::Receiver<VisibilityState> {
        let (tx, rx) = mpsc::channel(8);
        self.visibility.lock().unwrap().push(tx);
        rx
    }

    fn watch_fullscreen(&self) -> mpsc::Receiver<bool> {
        let (tx, rx) = mpsc::channel(8);
        self.fullscreen.lock().unwrap().push(tx);
        rx
    }
}

// ---------------------------------------------------------------------------
// Protocol transport
// ---------------------------------------------------------------------------

pub struct FakeTransport {
    halves: Mutex<Option<(mpsc::Sender<ClientMessage>, mpsc::Receiver<SocketEvent>)>>,
    pub fail_connect: Mutex<bool>,
}

impl FakeTransport {
    /// Returns the transport plus the server-side handles: a sender for
    /// injecting socket events and a receiver observing every client frame.
    pub fn new() -> (
        Arc<Self>,
        mpsc::Sender<SocketEvent>,
        mpsc::Receiver<ClientMessage>,
    ) {
        let (out_tx, out_rx) = mpsc::channel(64);
        let (in_tx, in_rx) = mpsc::channel(64);
        (
            Arc::new(Self {
                halves: Mutex::new(Some((out_tx, in_rx))),
                fail_connect: Mutex::new(false),
            }),
            in_tx,
            out_rx,
        )
    }
}

#[async_trait]
impl ProtocolTransport for FakeTransport {
    async fn connect(&self, _job_id: &str, _resume_id: &str) -> SessionResult<ProtocolConnection> {
        if *self.fail_connect.lock().unwrap() {
            return Err(SessionError::ConnectionLost("backend unreachable".into()));
        }
        let (outbound, inbound) = self
            .halves
            .lock()
            .unwrap()
            .take()
            .expect("fake transport connected twice");
        Ok(ProtocolConnection::from_channels(outbound, inbound))
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

pub struct FakeTts {
    pub spoken: Mutex<Vec<(String, String)>>,
    pub fail: Mutex<bool>,
}

impl FakeTts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        })
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl TtsProvider for FakeTts {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        _settings: &VoiceSettings,
    ) -> SessionResult<Vec<u8>> {
        if *self.fail.lock().unwrap() {
            return Err(SessionError::Playback("provider down".into()));
        }
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), voice_id.to_string()));
        Ok(vec![0u8; 16])
    }
}

pub struct FakeSink {
    pub fail: Mutex<bool>,
}

impl FakeSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: Mutex::new(false),
        })
    }
}

#[async_trait]
impl AudioSink for FakeSink {
    async fn play(&self, _audio: Vec<u8>) -> SessionResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(SessionError::Playback("decode failed".into()));
        }
        Ok(())
    }
}

pub struct FakeLocalSynth {
    pub spoken: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

impl FakeLocalSynth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        })
    }
}

#[async_trait]
impl LocalSynthesis for FakeLocalSynth {
    async fn speak(&self, text: &str) -> SessionResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(SessionError::Playback("no synthesis voice".into()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tokens + transcription
// ---------------------------------------------------------------------------

pub struct FakeTokens {
    pub fail: Mutex<bool>,
    pub fetches: AtomicU32,
}

impl FakeTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: Mutex::new(false),
            fetches: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TokenSource for FakeTokens {
    async fn fetch(&self) -> SessionResult<String> {
        if *self.fail.lock().unwrap() {
            return Err(SessionError::Token("token endpoint unavailable".into()));
        }
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(format!("tok-{}", n))
    }
}

/// Test-side handles of one opened transcription session.
pub struct TranscriptHarness {
    pub events: mpsc::Sender<TranscriptEvent>,
    pub audio: mpsc::Receiver<Vec<u8>>,
    pub token: String,
}

pub struct FakeTranscription {
    harness_tx: mpsc::UnboundedSender<TranscriptHarness>,
    pub fail_open: Mutex<bool>,
}

impl FakeTranscription {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<TranscriptHarness>) {
        let (harness_tx, harness_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                harness_tx,
                fail_open: Mutex::new(false),
            }),
            harness_rx,
        )
    }
}

#[async_trait]
impl TranscriptionProvider for FakeTranscription {
    async fn open(&self, token: &str) -> SessionResult<TranscriptionSession> {
        if *self.fail_open.lock().unwrap() {
            return Err(SessionError::TranscriptionUnavailable(
                "handshake rejected".into(),
            ));
        }
        let (audio_tx, audio_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let _ = self.harness_tx.send(TranscriptHarness {
            events: event_tx,
            audio: audio_rx,
            token: token.to_string(),
        });
        Ok(TranscriptionSession {
            audio_tx,
            events: event_rx,
        })
    }
}

// ---------------------------------------------------------------------------
// Rig: real setup + controller over the fakes
// ---------------------------------------------------------------------------

pub struct Rig {
    pub handle: SessionHandle,
    pub done: JoinHandle<SessionPhase>,
    pub server: mpsc::Sender<SocketEvent>,
    pub sent: mpsc::Receiver<ClientMessage>,
    pub media: Arc<FakeMedia>,
    pub released: mpsc::UnboundedReceiver<MediaKind>,
    pub tts: Arc<FakeTts>,
    pub local_synth: Arc<FakeLocalSynth>,
    pub tokens: Arc<FakeTokens>,
    pub transcripts: mpsc::UnboundedReceiver<TranscriptHarness>,
}

pub fn test_limits() -> SessionLimits {
    SessionLimits {
        // Large enough that auto-advanced ticks never expire mid-test.
        time_budget_secs: 100_000,
        tab_switch_threshold: 3,
        fullscreen_exit_threshold: 2,
        fullscreen_reentry_delay_ms: 50,
    }
}

/// Build a playback service over fresh fakes.
pub fn fake_playback() -> (Arc<SpeechPlaybackService>, Arc<FakeTts>, Arc<FakeLocalSynth>) {
    let tts = FakeTts::new();
    let local_synth = FakeLocalSynth::new();
    let playback = Arc::new(SpeechPlaybackService::new(
        tts.clone(),
        FakeSink::new(),
        local_synth.clone(),
        VoiceSettings::default(),
    ));
    (playback, tts, local_synth)
}

/// Walk the real setup checklist to completion over the given fakes.
pub async fn complete_setup(
    media: &Arc<FakeMedia>,
    playback: &Arc<SpeechPlaybackService>,
) -> SessionResources {
    let mut setup = SetupOrchestrator::new(
        media.clone(),
        playback.clone(),
        Voice::new("voice-1", "Aria"),
    );
    setup.request_permissions().await.expect("permissions granted");
    setup.select_voice(Voice::new("voice-1", "Aria"));
    setup.start_screen_share().await.expect("share granted");
    setup.complete_setup().await.expect("setup completes")
}

/// Drive the real orchestrator through a clean setup and activate a session
/// over scripted fakes.
pub async fn activate_session(limits: SessionLimits) -> Rig {
    let (media, released) = FakeMedia::new();
    let (transport, server, sent) = FakeTransport::new();
    let tokens = FakeTokens::new();
    let (transcription, transcripts) = FakeTranscription::new();

    let (playback, tts, local_synth) = fake_playback();
    let resources = complete_setup(&media, &playback).await;

    let deps = SessionDeps {
        transport,
        media: media.clone(),
        playback,
        tokens: tokens.clone(),
        transcription,
        limits,
    };

    let session = SessionController::activate("job-1", "resume-1", resources, deps)
        .await
        .expect("session activates");

    // Activation announces the pre-established screen share.
    let mut sent = sent;
    let handshake = sent.recv().await.expect("handshake frame");
    assert_eq!(
        handshake,
        ClientMessage::ScreenShareStatus {
            action: ScreenShareAction::Started,
        }
    );

    Rig {
        handle: session.handle,
        done: session.done,
        server,
        sent,
        media,
        released,
        tts,
        local_synth,
        tokens,
        transcripts,
    }
}

/// Await the next outbound frame.
pub async fn next_sent(rig: &mut Rig) -> ClientMessage {
    rig.sent.recv().await.expect("client frame expected")
}

/// Wait (bounded) until the published snapshot satisfies a predicate.
pub async fn wait_snapshot<F>(handle: &SessionHandle, predicate: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let mut watch = handle.watch();
    tokio::time::timeout(Duration::from_secs(5), async move {
        loop {
            let snapshot = watch.borrow_and_update().clone();
            if predicate(&snapshot) {
                return snapshot;
            }
            if watch.changed().await.is_err() {
                panic!("session ended before the snapshot condition was met");
            }
        }
    })
    .await
    .expect("snapshot condition not reached in time")
}
