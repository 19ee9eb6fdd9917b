use crate::capture::CaptureNotice;
use crate::media::VisibilityState;
use crate::protocol::SocketEvent;

/// User-initiated commands delivered through the session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    /// Begin a capture activation (push-to-talk pressed).
    StartAnswer,
    /// End the capture activation and submit whatever was transcribed.
    StopAnswer,
    /// End the interview early.
    EndInterview,
}

/// Everything the dispatch loop can react to. Every asynchronous source is
/// funneled into one channel of these, so handlers never run in parallel
/// and the terminal-phase guard is checked within a single dispatch step.
#[derive(Debug)]
pub enum SessionEvent {
    /// Inbound protocol frame or socket closure.
    Socket(SocketEvent),
    /// Document visibility changed.
    Visibility(VisibilityState),
    /// Fullscreen state changed; payload is whether fullscreen is now on.
    Fullscreen(bool),
    /// One second elapsed on the countdown.
    Tick,
    /// The user stopped screen sharing from the runtime chrome.
    ScreenShareEnded,
    /// The delayed automatic fullscreen re-entry attempt is due.
    RefullscreenDue,
    /// Notice from the capture pumps.
    Capture(CaptureNotice),
    /// Command from the UI layer.
    Command(UserCommand),
}
