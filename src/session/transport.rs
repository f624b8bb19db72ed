use crate::error::SessionResult;

/// Client-facing duplex connection, as seen by a session.
///
/// Implemented over an axum WebSocket sink in `http::ws`; tests provide an
/// in-memory implementation.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON text frame
    async fn send_text(&self, text: String) -> SessionResult<()>;

    /// Send a binary frame (translated audio)
    async fn send_binary(&self, data: Vec<u8>) -> SessionResult<()>;

    /// Whether both ends still consider the connection open
    fn is_open(&self) -> bool;
}

/// Frame received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// JSON control message
    Text(String),
    /// Int16 PCM audio chunk
    Binary(Vec<u8>),
    Disconnect,
}
