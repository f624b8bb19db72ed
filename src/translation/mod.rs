//! External speech-to-speech translation backends

mod loopback;
mod nats;
mod service;

pub use loopback::LoopbackService;
pub use nats::NatsTranslationService;
pub use service::{AudioCallback, ErrorCallback, StreamCallbacks, TranslationService};

use crate::config::{AudioConfig, BackendKind, TranslationConfig};
use std::sync::Arc;
use std::time::Duration;

/// Translation backend factory
pub struct TranslationServiceFactory;

impl TranslationServiceFactory {
    /// Create the backend selected in configuration
    pub fn create(config: &TranslationConfig, audio: &AudioConfig) -> Arc<dyn TranslationService> {
        match config.backend {
            BackendKind::Loopback => Arc::new(LoopbackService::new(Duration::from_millis(
                config.loopback_delay_ms,
            ))),
            BackendKind::Nats => Arc::new(NatsTranslationService::new(config, audio)),
        }
    }
}
