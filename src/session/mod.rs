//! Translation session management
//!
//! This module provides the `Session` abstraction that manages:
//! - Stream start/stop against the translation service
//! - Hand-off of client audio through a `Relay` to the worker thread
//! - Delivery of translated audio, levels and status back to the client
//! - The single-active-session policy (`SessionManager`)

mod config;
mod control;
mod manager;
mod scheduler;
mod session;
mod status;
mod transport;

pub use config::SessionConfig;
pub use control::{ControlMessage, ServerMessage};
pub use manager::SessionManager;
pub use scheduler::LoopScheduler;
pub use session::Session;
pub use status::SessionStatus;
pub use transport::{Inbound, Transport};
