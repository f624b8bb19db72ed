use crate::config::{AudioConfig, Config};
use std::time::Duration;

/// Per-session settings derived from the service configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Expected client audio format (chunk size validation)
    pub audio: AudioConfig,

    /// Relay consumer wake-up interval; bounds shutdown latency of the worker
    pub relay_poll_interval: Duration,

    /// Language used when `start_stream` omits one
    pub default_target_language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            relay_poll_interval: Duration::from_millis(500),
            default_target_language: "es-US".to_string(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            audio: config.audio.clone(),
            relay_poll_interval: config.translation.relay_poll_interval(),
            default_target_language: config.translation.default_target_language.clone(),
        }
    }
}
