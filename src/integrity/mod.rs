//! Academic-integrity policies: tab-visibility and fullscreen enforcement
//!
//! Each policy keeps its own monotone counter with a fixed threshold.
//! Crossing a threshold is a one-time event; the counters never affect each
//! other. The monitor is pure bookkeeping; the session dispatcher performs
//! the resulting side effects (warnings, protocol frames, termination).

use crate::config::SessionLimits;

/// Outcome of recording one violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Below the threshold: surface a graduated warning.
    Warning { count: u32, remaining: u32 },
    /// The threshold was crossed by this very violation. Fires once.
    Breach { count: u32 },
    /// Past the threshold; already escalated before.
    AlreadyBreached { count: u32 },
}

/// Per-policy violation tally with a fixed escalation threshold.
#[derive(Debug)]
pub struct ViolationCounter {
    count: u32,
    threshold: u32,
    breached: bool,
}

impl ViolationCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
            breached: false,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn record(&mut self) -> Escalation {
        self.count += 1;
        if self.breached {
            return Escalation::AlreadyBreached { count: self.count };
        }
        if self.count >= self.threshold {
            self.breached = true;
            Escalation::Breach { count: self.count }
        } else {
            Escalation::Warning {
                count: self.count,
                remaining: self.threshold - self.count,
            }
        }
    }
}

pub struct IntegrityMonitor {
    tab_switches: ViolationCounter,
    fullscreen_exits: ViolationCounter,
}

impl IntegrityMonitor {
    pub fn new(limits: &SessionLimits) -> Self {
        Self {
            tab_switches: ViolationCounter::new(limits.tab_switch_threshold),
            fullscreen_exits: ViolationCounter::new(limits.fullscreen_exit_threshold),
        }
    }

    /// Record one transition of the document to hidden.
    pub fn record_tab_switch(&mut self) -> Escalation {
        self.tab_switches.record()
    }

    /// Record one exit from fullscreen.
    pub fn record_fullscreen_exit(&mut self) -> Escalation {
        self.fullscreen_exits.record()
    }

    pub fn tab_switch_count(&self) -> u32 {
        self.tab_switches.count()
    }

    pub fn fullscreen_exit_count(&self) -> u32 {
        self.fullscreen_exits.count()
    }
}
