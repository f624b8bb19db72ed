use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Origins allowed by the CORS layer (empty = no CORS headers)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Audio format expected from the client and sent to the translation service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Samples per chunk (4800 = 300ms at 16kHz)
    pub chunk_size: usize,
    pub channels: u16,
    /// 2 = int16 PCM
    pub bytes_per_sample: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            chunk_size: 4800,
            channels: 1,
            bytes_per_sample: 2,
        }
    }
}

impl AudioConfig {
    /// Nominal duration of one chunk, used to derive source positions
    pub fn seconds_per_chunk(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.chunk_size as f64 / self.sample_rate as f64
    }

    /// Expected byte length of one client chunk
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_size * self.bytes_per_sample * self.channels as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Echo audio back (local development and tests)
    Loopback,
    /// External translation service reached over NATS
    Nats,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub backend: BackendKind,
    pub nats_url: String,
    pub source_language: String,
    pub model: String,
    pub default_target_language: String,
    /// Upper bound on how long a stopped relay can keep its consumer blocked
    pub relay_poll_interval_ms: u64,
    /// How long to wait for the service's final reply after end-of-stream
    pub drain_timeout_ms: u64,
    pub loopback_delay_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Loopback,
            nats_url: "nats://localhost:4222".to_string(),
            source_language: "en-US".to_string(),
            model: "megatronnmt_any_any_1b".to_string(),
            default_target_language: "es-US".to_string(),
            relay_poll_interval_ms: 500,
            drain_timeout_ms: 2000,
            loopback_delay_ms: 0,
        }
    }
}

impl TranslationConfig {
    pub fn relay_poll_interval(&self) -> Duration {
        Duration::from_millis(self.relay_poll_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Retained events before the oldest are evicted
    pub capacity: usize,
    /// Per-subscriber queue depth; deliveries to a full queue are dropped
    pub subscriber_queue_size: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            subscriber_queue_size: 10_000,
        }
    }
}

/// A target language the translation service can synthesize
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
    pub code: String,
    pub name: String,
    pub voice: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![LanguageConfig {
        code: "es-US".to_string(),
        name: "Spanish (US)".to_string(),
        voice: "Magpie-Multilingual.ES-US.Isabela".to_string(),
        available: true,
    }]
}

impl Config {
    /// Load from a config file (extension optional) overlaid with
    /// `S2S__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("S2S").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn language(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|l| l.code == code)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "s2s-relay".to_string(),
                http: HttpConfig {
                    bind: "0.0.0.0".to_string(),
                    port: 8000,
                },
                cors_origins: Vec::new(),
            },
            audio: AudioConfig::default(),
            translation: TranslationConfig::default(),
            timing: TimingConfig::default(),
            languages: default_languages(),
        }
    }
}
