use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a translation session as reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Connected,
    Listening,
    Processing,
    Stopped,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Connected => "connected",
            SessionStatus::Listening => "listening",
            SessionStatus::Processing => "processing",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Error => "error",
        }
    }

    /// Transition table.
    ///
    /// `Connected` is initial only. Any status may move to `Listening`
    /// (start, restart, retry after error), `Stopped` or `Error`.
    /// `Processing` is reachable only from an active stream.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;

        match (self, next) {
            (_, Connected) => false,
            (_, Listening) | (_, Stopped) | (_, Error) => true,
            (Listening, Processing) | (Processing, Processing) => true,
            (_, Processing) => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
