use crate::config::Config;
use crate::session::{SessionConfig, SessionManager};
use crate::timing::TimingBus;
use crate::translation::TranslationService;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Single-active-session manager for `/ws/translate`
    pub sessions: Arc<SessionManager>,

    /// Latency telemetry shared by sessions, export and `/ws/metrics`
    pub timing: Arc<TimingBus>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<dyn TranslationService>) -> Self {
        let timing = Arc::new(TimingBus::from_config(&config.audio, &config.timing));
        let sessions = Arc::new(SessionManager::new(
            service,
            Arc::clone(&timing),
            SessionConfig::from(&config),
        ));

        Self {
            config: Arc::new(config),
            sessions,
            timing,
        }
    }

    pub fn service(&self) -> &Arc<dyn TranslationService> {
        self.sessions.service()
    }
}
