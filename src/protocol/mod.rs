//! Wire protocol between the interview client and the orchestration backend

pub mod messages;
pub mod socket;

pub use messages::{ClientMessage, ScreenShareAction, ServerMessage};
pub use socket::{ProtocolConnection, ProtocolTransport, SocketEvent, WsTransport};
