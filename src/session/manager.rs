use super::config::SessionConfig;
use super::session::Session;
use super::transport::Transport;
use crate::error::{SessionError, SessionResult};
use crate::timing::TimingBus;
use crate::translation::TranslationService;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Admits one translation session at a time.
///
/// The translation service connection is single-tenant: a new client
/// replaces the previous one, which is closed silently.
pub struct SessionManager {
    service: Arc<dyn TranslationService>,
    timing: Arc<TimingBus>,
    config: SessionConfig,
    active: Mutex<Option<Arc<Session>>>,
}

impl SessionManager {
    pub fn new(
        service: Arc<dyn TranslationService>,
        timing: Arc<TimingBus>,
        config: SessionConfig,
    ) -> Self {
        Self {
            service,
            timing,
            config,
            active: Mutex::new(None),
        }
    }

    /// Create the session for a new connection, closing any existing one.
    ///
    /// Fails with `SessionError::Connectivity` if the translation service
    /// cannot be reached.
    pub async fn create_session(&self, transport: Arc<dyn Transport>) -> SessionResult<Arc<Session>> {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            info!("Replacing active session {}", previous.id());
            previous.close().await;
        }

        if !self.service.is_connected() {
            info!("Connecting to {} translation service", self.service.name());
            if let Err(e) = self.service.connect().await {
                warn!("Translation service unavailable: {}", e);
                return Err(match e {
                    SessionError::Connectivity(_) => e,
                    other => SessionError::Connectivity(other.to_string()),
                });
            }
        }

        let session = Session::new(
            transport,
            Arc::clone(&self.service),
            Arc::clone(&self.timing),
            self.config.clone(),
        );
        *active = Some(Arc::clone(&session));

        Ok(session)
    }

    /// Remove `session` if it is still the active one.
    ///
    /// A session that was already replaced is left alone; its successor
    /// keeps the slot.
    pub async fn remove_session(&self, session: &Arc<Session>) {
        let mut active = self.active.lock().await;

        match active.as_ref() {
            Some(current) if Arc::ptr_eq(current, session) => {
                info!("Removing session {}", session.id());
                session.close().await;
                *active = None;
            }
            _ => info!("Session {} already replaced, not removing", session.id()),
        }
    }

    pub async fn active_session(&self) -> Option<Arc<Session>> {
        self.active.lock().await.clone()
    }

    pub fn service(&self) -> &Arc<dyn TranslationService> {
        &self.service
    }
}
