// Tests for configuration loading

use s2s_relay::config::BackendKind;
use s2s_relay::{Config, SessionConfig};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let file = write_config(
        r#"
[service]
name = "relay-test"

[service.http]
bind = "127.0.0.1"
port = 9100
"#,
    );

    let cfg = Config::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(cfg.service.name, "relay-test");
    assert_eq!(cfg.service.http.port, 9100);
    assert!(cfg.service.cors_origins.is_empty());
    assert_eq!(cfg.audio.sample_rate, 16000);
    assert_eq!(cfg.audio.chunk_size, 4800);
    assert_eq!(cfg.translation.backend, BackendKind::Loopback);
    assert_eq!(cfg.translation.default_target_language, "es-US");
    assert_eq!(cfg.translation.relay_poll_interval(), Duration::from_millis(500));
    assert_eq!(cfg.timing.capacity, 100_000);
    assert_eq!(cfg.timing.subscriber_queue_size, 10_000);
    assert!(cfg.language("es-US").is_some());
}

#[test]
fn test_load_overrides() {
    let file = write_config(
        r#"
[service]
name = "relay-test"
cors_origins = ["http://localhost:5173"]

[service.http]
bind = "0.0.0.0"
port = 8000

[audio]
sample_rate = 24000
chunk_size = 2400

[translation]
backend = "nats"
nats_url = "nats://broker:4222"
relay_poll_interval_ms = 100

[timing]
capacity = 500

[[languages]]
code = "fr-FR"
name = "French"
voice = "fr-voice"
"#,
    );

    let cfg = Config::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(cfg.service.cors_origins, vec!["http://localhost:5173"]);
    assert_eq!(cfg.audio.sample_rate, 24000);
    assert_eq!(cfg.audio.bytes_per_sample, 2);
    assert!((cfg.audio.seconds_per_chunk() - 0.1).abs() < 1e-9);
    assert_eq!(cfg.translation.backend, BackendKind::Nats);
    assert_eq!(cfg.translation.nats_url, "nats://broker:4222");
    assert_eq!(cfg.timing.capacity, 500);
    assert_eq!(cfg.timing.subscriber_queue_size, 10_000);

    assert_eq!(cfg.languages.len(), 1);
    let fr = cfg.language("fr-FR").unwrap();
    assert!(fr.available);
    assert!(cfg.language("es-US").is_none());

    let session = SessionConfig::from(&cfg);
    assert_eq!(session.relay_poll_interval, Duration::from_millis(100));
    assert_eq!(session.audio.chunk_size, 2400);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(Config::load(path.to_str().unwrap()).is_err());
}

#[test]
fn test_default_audio_chunk_geometry() {
    let cfg = Config::default();
    assert!((cfg.audio.seconds_per_chunk() - 0.3).abs() < 1e-9);
    assert_eq!(cfg.audio.chunk_bytes(), 9600);
    assert_eq!(cfg.service.http.port, 8000);
}
