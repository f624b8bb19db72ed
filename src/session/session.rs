use super::config::SessionConfig;
use super::control::{ControlMessage, ServerMessage};
use super::scheduler::LoopScheduler;
use super::status::SessionStatus;
use super::transport::{Inbound, Transport};
use crate::audio::{is_expected_size, rms_level, AudioChunk};
use crate::error::{SessionError, SessionResult};
use crate::relay::Relay;
use crate::timing::{Stage, TimingBus};
use crate::translation::{StreamCallbacks, TranslationService};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// One client connection relaying audio to the translation service.
///
/// Owns at most one `Relay` at a time. Stream start/stop/close are
/// serialized by the relay mutex; results coming back from the worker
/// thread are re-scheduled onto the runtime that started the stream.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    service: Arc<dyn TranslationService>,
    timing: Arc<TimingBus>,

    /// Active relay, if streaming. Guards all stream transitions.
    relay: Mutex<Option<Arc<Relay>>>,

    status: StdMutex<SessionStatus>,
    target_language: StdMutex<String>,

    /// Set once by `close`; suppresses every later send
    closed: AtomicBool,
}

impl Session {
    pub fn new(
        transport: Arc<dyn Transport>,
        service: Arc<dyn TranslationService>,
        timing: Arc<TimingBus>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let id = Uuid::new_v4();
        info!("Creating translation session {}", id);

        let target_language = config.default_target_language.clone();
        Arc::new(Self {
            id,
            config,
            transport,
            service,
            timing,
            relay: Mutex::new(None),
            status: StdMutex::new(SessionStatus::Connected),
            target_language: StdMutex::new(target_language),
            closed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn target_language(&self) -> String {
        self.target_language
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Relay currently attached to the session
    pub async fn current_relay(&self) -> Option<Arc<Relay>> {
        self.relay.lock().await.clone()
    }

    /// Tell the client it has been admitted
    pub async fn announce(&self) {
        self.send_message(ServerMessage::Status {
            status: self.status(),
            message: "Connected to translation service".to_string(),
        })
        .await;
    }

    /// Dispatch one inbound frame. Returns `false` once the client is gone.
    pub async fn handle_inbound(self: &Arc<Self>, frame: Inbound) -> bool {
        match frame {
            Inbound::Text(text) => self.handle_text(&text).await,
            Inbound::Binary(bytes) => self.process_audio(bytes).await,
            Inbound::Disconnect => return false,
        }
        true
    }

    /// Handle a JSON control message
    pub async fn handle_text(self: &Arc<Self>, text: &str) {
        match ControlMessage::parse(text) {
            Ok(ControlMessage::StartStream { target_language }) => {
                let target_language =
                    target_language.unwrap_or_else(|| self.config.default_target_language.clone());
                self.start_stream(&target_language).await;
            }
            Ok(ControlMessage::StopStream) => self.stop_stream().await,
            Ok(ControlMessage::Ping) => self.send_message(ServerMessage::Pong).await,
            Err(e) => {
                // Reply without touching the session status; the stream keeps running
                warn!("Session {}: rejected control message: {}", self.id, e);
                self.send_message(ServerMessage::Error {
                    message: e.to_string(),
                })
                .await;
            }
        }
    }

    /// Start (or restart) translation into `target_language`
    pub async fn start_stream(self: &Arc<Self>, target_language: &str) {
        let mut relay_slot = self.relay.lock().await;

        if self.is_closed() {
            debug!("Session {} closed, ignoring start_stream", self.id);
            return;
        }

        info!(
            "Session {}: start_stream target={} status={}",
            self.id,
            target_language,
            self.status()
        );

        if let Some(previous) = relay_slot.take() {
            info!("Session {}: stopping existing stream before starting new one", self.id);
            previous.stop();
        }

        *self
            .target_language
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = target_language.to_string();

        let relay = Arc::new(
            Relay::new(self.config.relay_poll_interval).with_timing(Arc::clone(&self.timing)),
        );
        let callbacks = self.stream_callbacks(&relay, LoopScheduler::current());

        match self
            .service
            .stream(target_language, Arc::clone(&relay), callbacks)
        {
            Ok(()) => {
                *relay_slot = Some(relay);
                self.send_status(
                    SessionStatus::Listening,
                    format!("Translating to {}", target_language),
                )
                .await;
            }
            Err(e) => {
                relay.stop();
                error!("Session {}: failed to start stream: {}", self.id, e);
                self.send_error(format!("Failed to start stream: {}", e)).await;
            }
        }
    }

    /// Stop the current stream (if any) and notify the client
    pub async fn stop_stream(&self) {
        let mut relay_slot = self.relay.lock().await;

        info!("Session {}: stop_stream status={}", self.id, self.status());

        if let Some(relay) = relay_slot.take() {
            relay.stop();
        }

        self.send_status(SessionStatus::Stopped, "Stream stopped").await;
    }

    /// Forward one client audio chunk to the active stream.
    ///
    /// Ignored unless the session is listening with a relay attached.
    pub async fn process_audio(&self, bytes: Vec<u8>) {
        let relay = {
            let relay_slot = self.relay.lock().await;
            let status = self.status();
            match relay_slot.as_ref() {
                Some(relay) if status == SessionStatus::Listening => Arc::clone(relay),
                _ => {
                    debug!(
                        "Session {}: ignoring audio, status={} relay={}",
                        self.id,
                        status,
                        relay_slot.is_some()
                    );
                    return;
                }
            }
        };

        let len = bytes.len();
        let chunk_index = self.timing.record(Stage::AudioReceived, len, true);

        if !is_expected_size(&bytes, &self.config.audio) {
            debug!(
                "Session {}: chunk of {} bytes (expected {})",
                self.id,
                len,
                self.config.audio.chunk_bytes()
            );
        }

        let rms = rms_level(&bytes);
        relay.submit(AudioChunk::new(chunk_index, bytes));

        self.send_level(rms).await;
    }

    /// Close without notifying the client. Idempotent.
    pub async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Closing session {}", self.id);
        }

        if let Some(relay) = self.relay.lock().await.take() {
            relay.stop();
        }
    }

    pub async fn send_status(&self, status: SessionStatus, message: impl Into<String>) {
        if let Err(e) = self.transition(status) {
            warn!("Session {}: {}", self.id, e);
            return;
        }

        self.send_message(ServerMessage::Status {
            status,
            message: message.into(),
        })
        .await;
    }

    /// Report an error to the client; moves the session to `Error`
    pub async fn send_error(&self, message: impl Into<String>) {
        if let Err(e) = self.transition(SessionStatus::Error) {
            warn!("Session {}: {}", self.id, e);
        }

        self.send_message(ServerMessage::Error {
            message: message.into(),
        })
        .await;
    }

    /// Send translated audio to the client
    pub async fn send_audio(&self, audio: Vec<u8>) {
        if !self.is_transport_open() {
            return;
        }

        let len = audio.len();
        match self.transport.send_binary(audio).await {
            Ok(()) => {
                debug!("Session {}: sent {} bytes of audio", self.id, len);
                self.timing.record(Stage::AudioSentToClient, len, false);
            }
            Err(e) => warn!("Session {}: failed to send audio: {}", self.id, e),
        }
    }

    pub async fn send_level(&self, rms: f32) {
        self.send_message(ServerMessage::Level { rms }).await;
    }

    async fn send_message(&self, message: ServerMessage) {
        if !self.is_transport_open() {
            return;
        }

        if let Err(e) = self.transport.send_text(message.to_json()).await {
            debug!("Session {}: dropped message: {}", self.id, e);
        }
    }

    fn is_transport_open(&self) -> bool {
        !self.is_closed() && self.transport.is_open()
    }

    fn transition(&self, next: SessionStatus) -> SessionResult<SessionStatus> {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        let from = *status;
        if !from.can_transition_to(next) {
            return Err(SessionError::InvalidTransition { from, to: next });
        }
        *status = next;
        Ok(from)
    }

    /// Whether `relay` is still the one attached to the session
    async fn owns_relay(&self, relay: &Weak<Relay>) -> bool {
        let Some(relay) = relay.upgrade() else {
            return false;
        };
        match self.relay.lock().await.as_ref() {
            Some(current) => Arc::ptr_eq(current, &relay),
            None => false,
        }
    }

    /// Callbacks handed to the worker thread of `relay`.
    ///
    /// They hold only weak references and never touch session state
    /// directly: every send is scheduled onto `scheduler`, and dropped if
    /// `relay` has been stopped or replaced by then.
    fn stream_callbacks(
        self: &Arc<Self>,
        relay: &Arc<Relay>,
        scheduler: LoopScheduler,
    ) -> StreamCallbacks {
        let audio_session = Arc::downgrade(self);
        let error_session = Arc::downgrade(self);
        let audio_relay = Arc::downgrade(relay);
        let error_relay = Arc::downgrade(relay);
        let audio_scheduler = scheduler.clone();
        let timing = Arc::clone(&self.timing);

        let on_audio = move |bytes: Vec<u8>| {
            timing.record(Stage::AudioFromService, bytes.len(), false);

            let Some(session) = audio_session.upgrade() else {
                return;
            };
            if session.is_closed() {
                return;
            }
            let relay = audio_relay.clone();
            audio_scheduler.schedule(async move {
                if !session.owns_relay(&relay).await {
                    debug!("Session {}: dropping audio from a detached stream", session.id);
                    return;
                }
                session.send_audio(bytes).await;
            });
        };

        let on_error = move |message: String| {
            let Some(session) = error_session.upgrade() else {
                return;
            };
            if session.is_closed() {
                return;
            }
            let relay = error_relay.clone();
            scheduler.schedule(async move {
                if !session.owns_relay(&relay).await {
                    info!(
                        "Session {}: ignoring error from a detached stream: {}",
                        session.id, message
                    );
                    return;
                }
                session.send_error(message).await;
            });
        };

        StreamCallbacks::new(on_audio, on_error)
    }
}
