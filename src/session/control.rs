use super::status::SessionStatus;
use crate::error::{SessionError, SessionResult};
use serde::Serialize;
use serde_json::Value;

/// Control message sent by the client as a JSON text frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    StartStream { target_language: Option<String> },
    StopStream,
    Ping,
}

impl ControlMessage {
    /// Parse `{"type": ..., ...}`.
    ///
    /// Unknown types map to `UnknownControlMessage` so the caller can reply
    /// with the offending type name.
    pub fn parse(text: &str) -> SessionResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SessionError::InvalidControlMessage(e.to_string()))?;

        let msg_type = match value.get("type") {
            Some(Value::String(t)) => t.as_str(),
            Some(other) => return Err(SessionError::UnknownControlMessage(other.to_string())),
            None => return Err(SessionError::UnknownControlMessage("null".to_string())),
        };

        match msg_type {
            "start_stream" => {
                let target_language = value
                    .get("targetLanguage")
                    .or_else(|| value.get("target_language"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(ControlMessage::StartStream { target_language })
            }
            "stop_stream" => Ok(ControlMessage::StopStream),
            "ping" => Ok(ControlMessage::Ping),
            other => Err(SessionError::UnknownControlMessage(other.to_string())),
        }
    }
}

/// JSON message sent to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Status {
        status: SessionStatus,
        message: String,
    },
    Error {
        message: String,
    },
    /// Input level for the client's meter
    Level {
        rms: f32,
    },
    Pong,
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        // Serializing these variants cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
