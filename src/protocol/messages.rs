use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Inbound frame from the interview backend.
///
/// Question frames carry no `type` discriminator on the wire; frames with a
/// `type` field name one of the setup/completion events. Anything else is
/// classified as `Error` so a malformed frame can never crash the handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Question {
        text: String,
        question_count: u32,
        max_questions: u32,
    },
    ScreenShareRequest,
    ScreenShareConfirmed,
    InterviewComplete {
        max_questions: u32,
    },
    Error {
        message: String,
    },
}

/// Superset of the fields any inbound frame may carry.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
    question_count: Option<u32>,
    max_questions: Option<u32>,
    error: Option<String>,
}

impl ServerMessage {
    /// Classify a raw JSON text frame. Never fails: unrecognized shapes map
    /// to `ServerMessage::Error`.
    pub fn parse(raw: &str) -> Self {
        let frame: RawFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => {
                return ServerMessage::Error {
                    message: format!("malformed frame: {}", e),
                }
            }
        };

        if let Some(message) = frame.error {
            return ServerMessage::Error { message };
        }

        match frame.kind.as_deref() {
            // "screen_share_required" is the backend re-requesting after a
            // decline; the client answers both the same way.
            Some("screen_share_request") | Some("screen_share_required") => {
                ServerMessage::ScreenShareRequest
            }
            Some("screen_share_confirmed") => ServerMessage::ScreenShareConfirmed,
            Some("interview_complete") => ServerMessage::InterviewComplete {
                max_questions: frame.max_questions.unwrap_or(0),
            },
            Some(other) => ServerMessage::Error {
                message: format!("unrecognized message type: {}", other),
            },
            None => match frame.text {
                Some(text) => ServerMessage::Question {
                    text,
                    question_count: frame.question_count.unwrap_or(0),
                    max_questions: frame.max_questions.unwrap_or(0),
                },
                None => ServerMessage::Error {
                    message: "frame carries neither type, text nor error".to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenShareAction {
    Started,
    Ended,
}

impl ScreenShareAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ScreenShareAction::Started => "started",
            ScreenShareAction::Ended => "ended",
        }
    }
}

/// Outbound frame to the interview backend.
///
/// The backend reads answers from a bare `{"answer": ...}` object and treats
/// `"end interview"` as the quit sentinel, so serialization is hand-rolled to
/// match those shapes exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    ScreenShareStatus {
        action: ScreenShareAction,
    },
    Answer {
        text: String,
    },
    TabSwitch {
        count: u32,
    },
    FullscreenViolation {
        count: u32,
        timestamp: String,
    },
    EndSession {
        reason: String,
        violation_count: Option<u32>,
    },
}

impl Serialize for ClientMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ClientMessage::ScreenShareStatus { action } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "screen-share")?;
                map.serialize_entry("action", action.as_str())?;
                map.end()
            }
            ClientMessage::Answer { text } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("answer", text)?;
                map.end()
            }
            ClientMessage::TabSwitch { count } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "tab-switch")?;
                map.serialize_entry("count", count)?;
                map.end()
            }
            ClientMessage::FullscreenViolation { count, timestamp } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "fullscreen-violation")?;
                map.serialize_entry("count", count)?;
                map.serialize_entry("timestamp", timestamp)?;
                map.end()
            }
            ClientMessage::EndSession {
                reason,
                violation_count,
            } => {
                let len = if violation_count.is_some() { 3 } else { 2 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("answer", "end interview")?;
                map.serialize_entry("reason", reason)?;
                if let Some(count) = violation_count {
                    map.serialize_entry("violation_count", count)?;
                }
                map.end()
            }
        }
    }
}
