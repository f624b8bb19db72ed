// Shared test doubles for session and manager tests

#![allow(dead_code)]

use s2s_relay::{
    Relay, SessionError, SessionResult, StreamCallbacks, TranslationService, Transport,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Frame written to a `MockTransport`
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(Value),
    Binary(Vec<u8>),
}

/// In-memory transport recording everything sent through it
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<Sent>>,
    closed: AtomicBool,
    fail_sends: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate the client disconnecting
    pub fn disconnect(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Make every send fail while still reporting the transport as open
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(v) => Some(v),
                Sent::Binary(_) => None,
            })
            .collect()
    }

    pub fn binaries(&self) -> Vec<Vec<u8>> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Binary(b) => Some(b),
                Sent::Text(_) => None,
            })
            .collect()
    }

    /// Text messages with the given `type`
    pub fn of_type(&self, msg_type: &str) -> Vec<Value> {
        self.texts()
            .into_iter()
            .filter(|v| v["type"] == msg_type)
            .collect()
    }

    fn check(&self) -> SessionResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::TransportClosed);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SessionError::Transport("broken pipe".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send_text(&self, text: String) -> SessionResult<()> {
        self.check()?;
        let value: Value = serde_json::from_str(&text).expect("session sent invalid JSON");
        self.sent.lock().unwrap().push(Sent::Text(value));
        Ok(())
    }

    async fn send_binary(&self, data: Vec<u8>) -> SessionResult<()> {
        self.check()?;
        self.sent.lock().unwrap().push(Sent::Binary(data));
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

/// Service that records every relay it is given and never consumes it
#[derive(Default)]
pub struct RecordingService {
    pub relays: Mutex<Vec<Arc<Relay>>>,
    pub connect_calls: AtomicUsize,
    connected: AtomicBool,
    refuse_connect: AtomicBool,
    refuse_stream: AtomicBool,
}

impl RecordingService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unreachable() -> Arc<Self> {
        let service = Self::default();
        service.refuse_connect.store(true, Ordering::SeqCst);
        Arc::new(service)
    }

    pub fn set_refuse_connect(&self, refuse: bool) {
        self.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    pub fn set_refuse_stream(&self, refuse: bool) {
        self.refuse_stream.store(refuse, Ordering::SeqCst);
    }

    pub fn relays(&self) -> Vec<Arc<Relay>> {
        self.relays.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TranslationService for RecordingService {
    async fn connect(&self) -> SessionResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(SessionError::Connectivity("connection refused".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn stream(
        &self,
        _target_language: &str,
        source: Arc<Relay>,
        _callbacks: StreamCallbacks,
    ) -> SessionResult<()> {
        if self.refuse_stream.load(Ordering::SeqCst) {
            return Err(SessionError::StreamStart("Not connected to translation service".to_string()));
        }
        self.relays.lock().unwrap().push(source);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Service whose worker fails immediately after starting
pub struct FailingWorkerService;

#[async_trait::async_trait]
impl TranslationService for FailingWorkerService {
    async fn connect(&self) -> SessionResult<()> {
        Ok(())
    }

    fn disconnect(&self) {}

    fn is_connected(&self) -> bool {
        true
    }

    fn stream(
        &self,
        _target_language: &str,
        _source: Arc<Relay>,
        callbacks: StreamCallbacks,
    ) -> SessionResult<()> {
        std::thread::spawn(move || {
            callbacks.error("Translation error: model unavailable".to_string());
            callbacks.error("Translation error: second report".to_string());
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Service whose worker drains its relay, then emits one late audio frame
/// and a cancellation error, the way a backend reacts to being cut off
#[derive(Default)]
pub struct CancelOnStopService {
    relays: Mutex<Vec<Arc<Relay>>>,
}

impl CancelOnStopService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn relays(&self) -> Vec<Arc<Relay>> {
        self.relays.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TranslationService for CancelOnStopService {
    async fn connect(&self) -> SessionResult<()> {
        Ok(())
    }

    fn disconnect(&self) {}

    fn is_connected(&self) -> bool {
        true
    }

    fn stream(
        &self,
        _target_language: &str,
        source: Arc<Relay>,
        callbacks: StreamCallbacks,
    ) -> SessionResult<()> {
        self.relays.lock().unwrap().push(Arc::clone(&source));
        std::thread::spawn(move || {
            for _ in source.iter() {}
            callbacks.audio(vec![9; 4]);
            callbacks.error("Translation error: stream cancelled".to_string());
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "cancel-on-stop"
    }
}

/// Poll `cond` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// A full-size chunk of int16 PCM at the given sample value
pub fn pcm_chunk(sample: i16) -> Vec<u8> {
    std::iter::repeat(sample.to_le_bytes())
        .take(4800)
        .flatten()
        .collect()
}
