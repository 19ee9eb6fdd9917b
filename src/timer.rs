//! Fixed-budget countdown with a one-shot expiry signal

/// Outcome of applying one 1 Hz tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer not running; nothing changed.
    Idle,
    /// Seconds left after this tick.
    Remaining(u32),
    /// The budget just ran out. Reported exactly once.
    Expired,
}

/// Countdown state. The session dispatcher owns the actual interval and
/// feeds ticks in, so expiry is decided inside the single dispatch step.
#[derive(Debug)]
pub struct SessionTimer {
    remaining: u32,
    running: bool,
}

impl SessionTimer {
    pub fn new(budget_secs: u32) -> Self {
        Self {
            remaining: budget_secs,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            // Stop so further ticks are idle; expiry fires once.
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Remaining(self.remaining)
        }
    }
}
