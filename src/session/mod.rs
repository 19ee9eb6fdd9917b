//! Live session control
//!
//! The `SessionController` is the sole owner of the session phase. It opens
//! and owns the protocol socket, routes inbound and outbound messages, and
//! arbitrates termination: every end-triggering source funnels into one
//! idempotent `end_session` path, so exactly one terminal transition and one
//! resource teardown happen no matter how many sources fire together.

mod controller;
mod events;
mod phase;

pub use controller::{
    ActiveSession, EndReason, SessionController, SessionDeps, SessionHandle, SessionSnapshot,
};
pub use events::{SessionEvent, UserCommand};
pub use phase::SessionPhase;
