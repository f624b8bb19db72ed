// Tests for the client control protocol

use s2s_relay::session::{ControlMessage, ServerMessage};
use s2s_relay::{SessionError, SessionStatus};
use serde_json::{json, Value};

fn to_value(msg: &ServerMessage) -> Value {
    serde_json::from_str(&msg.to_json()).unwrap()
}

#[test]
fn test_parse_start_stream_camel_case() {
    let msg = ControlMessage::parse(r#"{"type":"start_stream","targetLanguage":"fr-FR"}"#).unwrap();
    assert_eq!(
        msg,
        ControlMessage::StartStream {
            target_language: Some("fr-FR".to_string())
        }
    );
}

#[test]
fn test_parse_start_stream_snake_case_and_missing() {
    let msg = ControlMessage::parse(r#"{"type":"start_stream","target_language":"de-DE"}"#).unwrap();
    assert_eq!(
        msg,
        ControlMessage::StartStream {
            target_language: Some("de-DE".to_string())
        }
    );

    let msg = ControlMessage::parse(r#"{"type":"start_stream"}"#).unwrap();
    assert_eq!(msg, ControlMessage::StartStream { target_language: None });
}

#[test]
fn test_parse_stop_and_ping() {
    assert_eq!(
        ControlMessage::parse(r#"{"type":"stop_stream"}"#).unwrap(),
        ControlMessage::StopStream
    );
    assert_eq!(
        ControlMessage::parse(r#"{"type":"ping","extra":1}"#).unwrap(),
        ControlMessage::Ping
    );
}

#[test]
fn test_parse_unknown_type() {
    let err = ControlMessage::parse(r#"{"type":"rewind"}"#).unwrap_err();
    assert!(matches!(err, SessionError::UnknownControlMessage(ref t) if t == "rewind"));
    assert_eq!(err.to_string(), "Unknown message type: rewind");

    let err = ControlMessage::parse(r#"{"targetLanguage":"es-US"}"#).unwrap_err();
    assert!(matches!(err, SessionError::UnknownControlMessage(_)));
}

#[test]
fn test_parse_malformed_json() {
    let err = ControlMessage::parse("{not json").unwrap_err();
    assert!(matches!(err, SessionError::InvalidControlMessage(_)));
}

#[test]
fn test_server_message_json() {
    assert_eq!(
        to_value(&ServerMessage::Status {
            status: SessionStatus::Listening,
            message: "Translating to es-US".to_string(),
        }),
        json!({"type": "status", "status": "listening", "message": "Translating to es-US"})
    );
    assert_eq!(
        to_value(&ServerMessage::Error {
            message: "boom".to_string()
        }),
        json!({"type": "error", "message": "boom"})
    );
    assert_eq!(to_value(&ServerMessage::Level { rms: 0.25 }), json!({"type": "level", "rms": 0.25}));
    assert_eq!(to_value(&ServerMessage::Pong), json!({"type": "pong"}));
}
