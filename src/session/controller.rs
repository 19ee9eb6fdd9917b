use super::events::{SessionEvent, UserCommand};
use super::phase::SessionPhase;
use crate::capture::{CaptureNotice, SpeechCaptureService, TokenSource, TranscriptionProvider};
use crate::config::SessionLimits;
use crate::error::{SessionError, SessionResult};
use crate::integrity::{Escalation, IntegrityMonitor};
use crate::media::{MediaCapabilities, MediaResources, VisibilityState};
use crate::playback::{SpeechPlaybackService, Voice};
use crate::protocol::{
    ClientMessage, ProtocolTransport, ScreenShareAction, ServerMessage, SocketEvent,
};
use crate::setup::SessionResources;
use crate::timer::{SessionTimer, TickOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Why a session reached its terminal phase. Every trigger (integrity
/// breaches, timer expiry, the user's end click, the backend's completion
/// message, a dropped screen share) converges on this one type and on
/// `SessionController::end_session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Backend sent `interview_complete`; no outbound end frame is owed.
    InterviewComplete,
    TabSwitchViolations,
    FullscreenViolations,
    TimeExpired,
    UserEnded,
    ScreenShareEnded,
}

impl EndReason {
    fn terminal_phase(self) -> SessionPhase {
        match self {
            EndReason::InterviewComplete => SessionPhase::Complete,
            _ => SessionPhase::Terminated,
        }
    }

    fn wire(self) -> Option<&'static str> {
        match self {
            EndReason::InterviewComplete => None,
            EndReason::TabSwitchViolations => Some("tab-switch-violations"),
            EndReason::FullscreenViolations => Some("fullscreen-violations"),
            EndReason::TimeExpired => Some("time-expired"),
            EndReason::UserEnded => Some("user-ended"),
            EndReason::ScreenShareEnded => Some("screen-share-ended"),
        }
    }
}

/// Mutable state the dispatcher applies events to. Everything the UI shows
/// is derived from this context, never stored as independent cells.
#[derive(Debug)]
struct SessionContext {
    phase: SessionPhase,
    question_count: u32,
    max_questions: u32,
    last_error: Option<String>,
    notice: Option<String>,
}

/// Read-only view of the session published after every dispatch step.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub question_count: u32,
    pub max_questions: u32,
    pub remaining_seconds: u32,
    pub listening: bool,
    pub last_error: Option<String>,
    pub notice: Option<String>,
}

impl SessionSnapshot {
    /// Question progress as shown to the candidate, e.g. "1/8".
    pub fn progress(&self) -> String {
        format!("{}/{}", self.question_count, self.max_questions)
    }
}

/// External collaborators injected into a session.
pub struct SessionDeps {
    pub transport: Arc<dyn ProtocolTransport>,
    pub media: Arc<dyn MediaCapabilities>,
    pub playback: Arc<SpeechPlaybackService>,
    pub tokens: Arc<dyn TokenSource>,
    pub transcription: Arc<dyn TranscriptionProvider>,
    pub limits: SessionLimits,
}

/// Handle held by the UI layer while the session runs.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<UserCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
    interim: watch::Receiver<String>,
}

impl SessionHandle {
    pub async fn start_answer(&self) {
        let _ = self.commands.send(UserCommand::StartAnswer).await;
    }

    pub async fn stop_answer(&self) {
        let _ = self.commands.send(UserCommand::StopAnswer).await;
    }

    pub async fn end_interview(&self) {
        let _ = self.commands.send(UserCommand::EndInterview).await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Live interim-transcript feed while an answer is being captured.
    /// Resets to empty whenever a fragment finalizes or capture stops.
    pub fn interim(&self) -> watch::Receiver<String> {
        self.interim.clone()
    }
}

/// A live session: the UI handle plus the dispatch task, which resolves to
/// the terminal phase.
pub struct ActiveSession {
    pub handle: SessionHandle,
    pub done: JoinHandle<SessionPhase>,
}

pub struct SessionController {
    ctx: SessionContext,
    voice: Voice,
    media: Arc<dyn MediaCapabilities>,
    playback: Arc<SpeechPlaybackService>,
    limits: SessionLimits,
    outbound: Option<mpsc::Sender<ClientMessage>>,
    socket_open: bool,
    capture: SpeechCaptureService,
    timer: SessionTimer,
    monitor: IntegrityMonitor,
    resources: MediaResources,
    event_tx: mpsc::Sender<SessionEvent>,
    forwarders: Vec<JoinHandle<()>>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Go live: open the protocol socket, announce the pre-established
    /// screen share, subscribe to visibility/fullscreen changes for the
    /// duration of the phase, start the countdown, and spawn the dispatch
    /// loop. The socket is only ever opened here, after setup has granted
    /// every stream.
    pub async fn activate(
        job_id: &str,
        resume_id: &str,
        mut resources: SessionResources,
        deps: SessionDeps,
    ) -> SessionResult<ActiveSession> {
        let connection = match deps.transport.connect(job_id, resume_id).await {
            Ok(connection) => connection,
            Err(e) => {
                // Activation failed before the controller took ownership;
                // stop the granted tracks here since teardown never runs.
                Self::release_setup_streams(&mut resources);
                return Err(e);
            }
        };
        let outbound = connection.outbound;

        // Screen sharing was established during setup, so the handshake is
        // pre-satisfied rather than negotiated live.
        if outbound
            .send(ClientMessage::ScreenShareStatus {
                action: ScreenShareAction::Started,
            })
            .await
            .is_err()
        {
            Self::release_setup_streams(&mut resources);
            return Err(SessionError::ConnectionLost(
                "socket closed during handshake".to_string(),
            ));
        }

        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(64);
        let (command_tx, mut command_rx) = mpsc::channel::<UserCommand>(8);

        // Every asynchronous source becomes a forwarder into the single
        // event channel. The forwarders are aborted at teardown, so no
        // subscription outlives the Active phase.
        let mut forwarders = Vec::new();

        let mut inbound = connection.inbound;
        let tx = event_tx.clone();
        forwarders.push(tokio::spawn(async move {
            while let Some(event) = inbound.recv().await {
                if tx.send(SessionEvent::Socket(event)).await.is_err() {
                    return;
                }
            }
        }));

        let mut visibility = deps.media.watch_visibility();
        let tx = event_tx.clone();
        forwarders.push(tokio::spawn(async move {
            while let Some(state) = visibility.recv().await {
                if tx.send(SessionEvent::Visibility(state)).await.is_err() {
                    return;
                }
            }
        }));

        let mut fullscreen = deps.media.watch_fullscreen();
        let tx = event_tx.clone();
        forwarders.push(tokio::spawn(async move {
            while let Some(is_fullscreen) = fullscreen.recv().await {
                if tx.send(SessionEvent::Fullscreen(is_fullscreen)).await.is_err() {
                    return;
                }
            }
        }));

        let share_ended = resources.share_ended;
        let tx = event_tx.clone();
        forwarders.push(tokio::spawn(async move {
            if share_ended.await.is_ok() {
                let _ = tx.send(SessionEvent::ScreenShareEnded).await;
            }
        }));

        let tx = event_tx.clone();
        forwarders.push(tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                if tx.send(SessionEvent::Command(command)).await.is_err() {
                    return;
                }
            }
        }));

        let (capture, mut notices) = SpeechCaptureService::new(
            Arc::clone(&deps.tokens),
            Arc::clone(&deps.transcription),
            Arc::clone(&deps.media),
            outbound.clone(),
        );
        let interim = capture.interim();
        let tx = event_tx.clone();
        forwarders.push(tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                if tx.send(SessionEvent::Capture(notice)).await.is_err() {
                    return;
                }
            }
        }));

        let mut timer = SessionTimer::new(deps.limits.time_budget_secs);
        timer.start();

        let ctx = SessionContext {
            phase: SessionPhase::Active,
            question_count: 0,
            max_questions: 0,
            last_error: None,
            notice: None,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            phase: ctx.phase,
            question_count: 0,
            max_questions: 0,
            remaining_seconds: timer.remaining(),
            listening: false,
            last_error: None,
            notice: None,
        });

        info!("session active for job={} resume={}", job_id, resume_id);

        let controller = Self {
            ctx,
            voice: resources.voice.clone(),
            media: Arc::clone(&deps.media),
            playback: Arc::clone(&deps.playback),
            limits: deps.limits.clone(),
            outbound: Some(outbound),
            socket_open: true,
            capture,
            timer,
            monitor: IntegrityMonitor::new(&deps.limits),
            resources: MediaResources {
                camera: resources.camera,
                microphone: resources.microphone,
                screen: resources.screen,
            },
            event_tx,
            forwarders,
            snapshot_tx,
        };

        let done = tokio::spawn(controller.run(event_rx));
        Ok(ActiveSession {
            handle: SessionHandle {
                commands: command_tx,
                snapshot: snapshot_rx,
                interim,
            },
            done,
        })
    }

    fn release_setup_streams(resources: &mut SessionResources) {
        resources.camera.release();
        resources.microphone.release();
        resources.screen.release();
    }

    /// Single dispatch loop. Handlers never run in parallel; the loop exits
    /// as soon as the phase turns terminal, so queued events behind a
    /// termination are simply never processed.
    async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> SessionPhase {
        let period = Duration::from_secs(1);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            let event = tokio::select! {
                Some(event) = events.recv() => event,
                _ = ticker.tick() => SessionEvent::Tick,
            };
            self.dispatch(event).await;
            self.publish();
            if self.ctx.phase.is_terminal() {
                break;
            }
        }
        self.ctx.phase
    }

    async fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Socket(SocketEvent::Message(message)) => {
                self.handle_server_message(message).await;
            }
            SessionEvent::Socket(SocketEvent::Closed { normal }) => {
                self.socket_open = false;
                if !normal && self.ctx.phase == SessionPhase::Active {
                    warn!("protocol socket closed unexpectedly");
                    // Surfaced to the candidate; the session does not
                    // auto-reconnect and the phase stays Active.
                    self.ctx.last_error =
                        Some("Connection to the interview server was lost".to_string());
                }
            }
            SessionEvent::Visibility(VisibilityState::Hidden) => {
                self.handle_tab_switch().await;
            }
            SessionEvent::Visibility(VisibilityState::Visible) => {}
            SessionEvent::Fullscreen(false) => {
                self.handle_fullscreen_exit().await;
            }
            SessionEvent::Fullscreen(true) => {}
            SessionEvent::Tick => match self.timer.tick() {
                TickOutcome::Expired => {
                    info!("interview time budget exhausted");
                    self.end_session(EndReason::TimeExpired).await;
                }
                TickOutcome::Remaining(_) | TickOutcome::Idle => {}
            },
            SessionEvent::ScreenShareEnded => {
                if self.ctx.phase == SessionPhase::Active {
                    warn!("screen share stopped by the candidate");
                    self.send(ClientMessage::ScreenShareStatus {
                        action: ScreenShareAction::Ended,
                    })
                    .await;
                    self.end_session(EndReason::ScreenShareEnded).await;
                }
            }
            SessionEvent::RefullscreenDue => {
                if self.ctx.phase == SessionPhase::Active {
                    if let Err(e) = self.media.enter_fullscreen().await {
                        warn!("automatic fullscreen re-entry failed: {}", e);
                    }
                }
            }
            SessionEvent::Capture(CaptureNotice::TranscriptionError(message)) => {
                // Abort the activation but keep finalized fragments; an
                // explicit stop can still flush them.
                error!("transcription failed mid-stream: {}", message);
                self.capture.abort();
                self.ctx.last_error = Some(format!("Transcription failed: {}", message));
            }
            SessionEvent::Command(command) => self.handle_command(command).await,
        }
    }

    async fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ScreenShareRequest => {
                // Sharing was established during setup; acknowledge again.
                self.send(ClientMessage::ScreenShareStatus {
                    action: ScreenShareAction::Started,
                })
                .await;
            }
            ServerMessage::ScreenShareConfirmed => {
                // Suppress the audio cue; the candidate already saw the
                // confirmation during setup.
            }
            ServerMessage::Question {
                text,
                question_count,
                max_questions,
            } => {
                self.ctx.question_count = question_count;
                self.ctx.max_questions = max_questions;
                if !text.is_empty() {
                    if let Err(e) = self.playback.speak(&text, &self.voice.id).await {
                        // Only a double failure reaches here.
                        self.ctx.last_error = Some(e.to_string());
                    }
                }
            }
            ServerMessage::InterviewComplete { max_questions } => {
                if max_questions > 0 {
                    self.ctx.max_questions = max_questions;
                }
                self.end_session(EndReason::InterviewComplete).await;
            }
            ServerMessage::Error { message } => {
                error!("backend error: {}", message);
                self.ctx.last_error = Some(message);
            }
        }
    }

    async fn handle_tab_switch(&mut self) {
        if self.ctx.phase != SessionPhase::Active {
            return;
        }
        let escalation = self.monitor.record_tab_switch();
        let count = self.monitor.tab_switch_count();
        self.send(ClientMessage::TabSwitch { count }).await;
        match escalation {
            Escalation::Warning { count, remaining } => {
                warn!("tab switch {} recorded ({} remaining)", count, remaining);
                self.ctx.notice = Some(format!(
                    "Warning {}: leaving the interview tab is not allowed. {} more and the interview ends.",
                    count, remaining
                ));
            }
            Escalation::Breach { count } => {
                warn!("tab switch threshold reached at {}", count);
                self.end_session(EndReason::TabSwitchViolations).await;
            }
            Escalation::AlreadyBreached { .. } => {}
        }
    }

    async fn handle_fullscreen_exit(&mut self) {
        if self.ctx.phase != SessionPhase::Active {
            return;
        }
        let escalation = self.monitor.record_fullscreen_exit();
        let count = self.monitor.fullscreen_exit_count();
        self.send(ClientMessage::FullscreenViolation {
            count,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
        .await;
        match escalation {
            Escalation::Warning { count, .. } => {
                warn!("fullscreen exit {} recorded, scheduling re-entry", count);
                self.ctx.notice = Some(
                    "Warning: the interview must stay in fullscreen. Returning shortly."
                        .to_string(),
                );
                let delay = Duration::from_millis(self.limits.fullscreen_reentry_delay_ms);
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(SessionEvent::RefullscreenDue).await;
                });
            }
            Escalation::Breach { count } => {
                warn!("fullscreen exit threshold reached at {}", count);
                self.end_session(EndReason::FullscreenViolations).await;
            }
            Escalation::AlreadyBreached { .. } => {}
        }
    }

    async fn handle_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::StartAnswer => {
                if self.ctx.phase != SessionPhase::Active {
                    return;
                }
                if !self.socket_open {
                    self.ctx.notice =
                        Some("Connection lost — answers cannot be recorded".to_string());
                    return;
                }
                if self.playback.is_speaking() {
                    self.ctx.notice =
                        Some("Please wait for the interviewer to finish speaking".to_string());
                    return;
                }
                if self.capture.is_listening() {
                    return;
                }
                if let Err(e) = self.capture.start().await {
                    warn!("capture failed to start: {}", e);
                    self.ctx.last_error = Some(e.to_string());
                }
            }
            UserCommand::StopAnswer => {
                if !self.capture.is_listening() && !self.capture.has_buffered() {
                    return;
                }
                match self.capture.stop().await {
                    Some(_) => self.ctx.notice = None,
                    None => {
                        self.ctx.notice =
                            Some("No speech detected — your answer was not sent".to_string());
                    }
                }
            }
            UserCommand::EndInterview => {
                self.end_session(EndReason::UserEnded).await;
            }
        }
    }

    /// The only path into a terminal phase. Idempotent: the terminal-phase
    /// guard is checked and set within one dispatch step, so however many
    /// sources fire in the same tick, exactly one `EndSession` goes out and
    /// teardown runs once.
    async fn end_session(&mut self, reason: EndReason) {
        if self.ctx.phase.is_terminal() {
            return;
        }
        info!("ending session: {:?}", reason);

        if let Some(wire) = reason.wire() {
            let violation_count = match reason {
                EndReason::FullscreenViolations => Some(self.monitor.fullscreen_exit_count()),
                EndReason::TabSwitchViolations => Some(self.monitor.tab_switch_count()),
                _ => None,
            };
            self.send(ClientMessage::EndSession {
                reason: wire.to_string(),
                violation_count,
            })
            .await;
        }

        self.ctx.phase = reason.terminal_phase();
        self.teardown().await;
    }

    /// Runs exactly once, from `end_session`: cancel capture, stop the
    /// countdown, release every owned track, leave fullscreen, close the
    /// socket with a normal code, and drop all subscriptions.
    async fn teardown(&mut self) {
        self.capture.cancel();
        self.timer.stop();
        self.resources.release_all();
        self.media.exit_fullscreen().await;
        // Dropping the sender makes the transport send a clean close frame.
        self.outbound.take();
        self.socket_open = false;
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        info!("session torn down (phase={})", self.ctx.phase);
    }

    async fn send(&mut self, message: ClientMessage) {
        if self.ctx.phase.is_terminal() {
            return;
        }
        if let Some(outbound) = &self.outbound {
            if outbound.send(message).await.is_err() {
                warn!("protocol send failed: socket closed");
                self.socket_open = false;
            }
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            phase: self.ctx.phase,
            question_count: self.ctx.question_count,
            max_questions: self.ctx.max_questions,
            remaining_seconds: self.timer.remaining(),
            listening: self.capture.is_listening(),
            last_error: self.ctx.last_error.clone(),
            notice: self.ctx.notice.clone(),
        });
    }
}
