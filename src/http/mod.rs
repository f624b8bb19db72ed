//! HTTP API server
//!
//! This module provides the client-facing surface:
//! - GET /ws/translate - Real-time translation WebSocket
//! - GET /ws/metrics - Live timing events
//! - POST /api/test/start, POST /api/test/stop - Latency test control
//! - GET /api/test/export - Timing events of the current or last test
//! - GET /api/languages, GET /api/config - Client configuration
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
pub use ws::WsTransport;
