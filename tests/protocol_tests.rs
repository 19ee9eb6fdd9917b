//! Wire-format tests for the interview protocol frames.

use candor_interview::{ClientMessage, ScreenShareAction, ServerMessage};
use serde_json::json;

#[test]
fn question_frames_carry_no_type_discriminator() {
    let parsed = ServerMessage::parse(
        r#"{"text":"Tell me about yourself.","question_count":1,"max_questions":8}"#,
    );
    assert_eq!(
        parsed,
        ServerMessage::Question {
            text: "Tell me about yourself.".to_string(),
            question_count: 1,
            max_questions: 8,
        }
    );
}

#[test]
fn question_counters_default_to_zero_when_missing() {
    let parsed = ServerMessage::parse(r#"{"text":"Why this role?"}"#);
    assert_eq!(
        parsed,
        ServerMessage::Question {
            text: "Why this role?".to_string(),
            question_count: 0,
            max_questions: 0,
        }
    );
}

#[test]
fn both_screen_share_prompts_map_to_the_same_request() {
    let request = ServerMessage::parse(r#"{"type":"screen_share_request"}"#);
    let required = ServerMessage::parse(r#"{"type":"screen_share_required"}"#);
    assert_eq!(request, ServerMessage::ScreenShareRequest);
    assert_eq!(required, ServerMessage::ScreenShareRequest);
}

#[test]
fn completion_frame_carries_the_question_total() {
    let parsed = ServerMessage::parse(r#"{"type":"interview_complete","max_questions":8}"#);
    assert_eq!(parsed, ServerMessage::InterviewComplete { max_questions: 8 });

    let bare = ServerMessage::parse(r#"{"type":"interview_complete"}"#);
    assert_eq!(bare, ServerMessage::InterviewComplete { max_questions: 0 });
}

#[test]
fn error_field_wins_over_everything_else() {
    let parsed = ServerMessage::parse(r#"{"type":"interview_complete","error":"backend down"}"#);
    assert_eq!(
        parsed,
        ServerMessage::Error {
            message: "backend down".to_string(),
        }
    );
}

#[test]
fn unknown_and_malformed_frames_classify_as_errors() {
    assert!(matches!(
        ServerMessage::parse(r#"{"type":"telemetry"}"#),
        ServerMessage::Error { .. }
    ));
    assert!(matches!(
        ServerMessage::parse(r#"{"status":"ok"}"#),
        ServerMessage::Error { .. }
    ));
    assert!(matches!(
        ServerMessage::parse("not json at all"),
        ServerMessage::Error { .. }
    ));
}

#[test]
fn screen_share_status_serializes_with_action() {
    let frame = serde_json::to_value(ClientMessage::ScreenShareStatus {
        action: ScreenShareAction::Started,
    })
    .unwrap();
    assert_eq!(frame, json!({"type": "screen-share", "action": "started"}));

    let frame = serde_json::to_value(ClientMessage::ScreenShareStatus {
        action: ScreenShareAction::Ended,
    })
    .unwrap();
    assert_eq!(frame, json!({"type": "screen-share", "action": "ended"}));
}

#[test]
fn answers_serialize_as_a_bare_answer_object() {
    let frame = serde_json::to_value(ClientMessage::Answer {
        text: "I led the migration.".to_string(),
    })
    .unwrap();
    assert_eq!(frame, json!({"answer": "I led the migration."}));
}

#[test]
fn violation_frames_carry_their_counts() {
    let frame = serde_json::to_value(ClientMessage::TabSwitch { count: 2 }).unwrap();
    assert_eq!(frame, json!({"type": "tab-switch", "count": 2}));

    let frame = serde_json::to_value(ClientMessage::FullscreenViolation {
        count: 1,
        timestamp: "2026-01-01T00:00:00+00:00".to_string(),
    })
    .unwrap();
    assert_eq!(
        frame,
        json!({
            "type": "fullscreen-violation",
            "count": 1,
            "timestamp": "2026-01-01T00:00:00+00:00",
        })
    );
}

#[test]
fn end_session_uses_the_quit_sentinel() {
    let frame = serde_json::to_value(ClientMessage::EndSession {
        reason: "tab-switch-violations".to_string(),
        violation_count: Some(3),
    })
    .unwrap();
    assert_eq!(
        frame,
        json!({
            "answer": "end interview",
            "reason": "tab-switch-violations",
            "violation_count": 3,
        })
    );

    let frame = serde_json::to_value(ClientMessage::EndSession {
        reason: "user-ended".to_string(),
        violation_count: None,
    })
    .unwrap();
    assert_eq!(frame, json!({"answer": "end interview", "reason": "user-ended"}));
}
