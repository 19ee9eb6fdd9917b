use std::fmt;

/// Lifecycle stage of an interview session.
///
/// Monotonic except for retriable sub-steps inside `Permissions` and
/// `ScreenShare`. The only exits from `Active` are `Complete` and
/// `Terminated`. Both are terminal: no further phase change or protocol
/// send is permitted afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Permissions,
    VoiceSelection,
    ScreenShare,
    Ready,
    Active,
    Complete,
    Terminated,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Complete | SessionPhase::Terminated)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Permissions => "permissions",
            SessionPhase::VoiceSelection => "voice-selection",
            SessionPhase::ScreenShare => "screen-share",
            SessionPhase::Ready => "ready",
            SessionPhase::Active => "active",
            SessionPhase::Complete => "complete",
            SessionPhase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
