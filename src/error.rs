//! Error types for the relay core

use crate::session::SessionStatus;
use thiserror::Error;

/// Failures surfaced by sessions, the session manager and translation backends.
///
/// End-of-stream is not an error: `Relay::next` returns `None`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Translation service unreachable when admitting a session
    #[error("Failed to connect to translation service: {0}")]
    Connectivity(String),

    /// External streaming call could not be initiated
    #[error("{0}")]
    StreamStart(String),

    /// Send attempted on a closed transport
    #[error("Transport closed")]
    TransportClosed,

    #[error("Transport send failed: {0}")]
    Transport(String),

    #[error("Unknown message type: {0}")]
    UnknownControlMessage(String),

    #[error("Invalid control message: {0}")]
    InvalidControlMessage(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
