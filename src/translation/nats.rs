use super::service::{spawn_stream_worker, StreamCallbacks, TranslationService};
use crate::config::{AudioConfig, TranslationConfig};
use crate::error::{SessionError, SessionResult};
use crate::nats::{decode_pcm, FrameFormat, NatsClient, TranslatedAudioMessage};
use crate::relay::Relay;
use anyhow::Context;
use futures::StreamExt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Translation backend reached over NATS.
///
/// Each stream gets its own id. Client chunks go out on
/// `s2s.audio.in.<id>`; the service answers on `s2s.audio.out.<id>` and
/// marks its last reply `final` once it has seen our final frame.
pub struct NatsTranslationService {
    url: String,
    source_language: String,
    model: String,
    audio: AudioConfig,
    drain_timeout: Duration,
    client: RwLock<Option<NatsClient>>,
}

impl NatsTranslationService {
    pub fn new(translation: &TranslationConfig, audio: &AudioConfig) -> Self {
        Self {
            url: translation.nats_url.clone(),
            source_language: translation.source_language.clone(),
            model: translation.model.clone(),
            audio: audio.clone(),
            drain_timeout: translation.drain_timeout(),
            client: RwLock::new(None),
        }
    }

    fn client(&self) -> Option<NatsClient> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl TranslationService for NatsTranslationService {
    async fn connect(&self) -> SessionResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        let client = NatsClient::connect(&self.url)
            .await
            .map_err(|e| SessionError::Connectivity(format!("{:#}", e)))?;

        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Some(client);
        Ok(())
    }

    fn disconnect(&self) {
        if self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            info!("Disconnected from NATS");
        }
    }

    fn is_connected(&self) -> bool {
        self.client().map(|c| c.is_connected()).unwrap_or(false)
    }

    fn stream(
        &self,
        target_language: &str,
        source: Arc<Relay>,
        callbacks: StreamCallbacks,
    ) -> SessionResult<()> {
        let client = self
            .client()
            .ok_or_else(|| SessionError::StreamStart("Not connected to translation service".to_string()))?;
        let handle = Handle::try_current()
            .map_err(|e| SessionError::StreamStart(format!("No async runtime: {}", e)))?;

        let stream_id = uuid::Uuid::new_v4().to_string();
        let format = FrameFormat {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            source_language: self.source_language.clone(),
            target_language: target_language.to_string(),
            model: self.model.clone(),
        };
        let drain_timeout = self.drain_timeout;

        info!(
            "Starting NATS translation stream {} ({} -> {})",
            stream_id, format.source_language, format.target_language
        );

        let callbacks = Arc::new(callbacks);
        let reader_callbacks = Arc::clone(&callbacks);

        spawn_stream_worker(format!("s2s-{}", stream_id), callbacks, move |callbacks| {
            let subscriber = handle
                .block_on(client.subscribe_translated_audio(&stream_id))
                .context("Failed to open response subscription")?;

            // Responses are read on the runtime; the callbacks are thread-safe
            let reader = handle.spawn(read_responses(subscriber, reader_callbacks));
            let _reader_guard = AbortOnDrop(reader.abort_handle());

            let mut sent = 0usize;
            for chunk in source.iter() {
                handle
                    .block_on(client.publish_audio_frame(
                        &stream_id,
                        &format,
                        &chunk.data,
                        chunk.index,
                        false,
                    ))
                    .with_context(|| format!("Failed to forward chunk {}", chunk.index))?;
                sent += 1;
            }

            handle.block_on(client.publish_audio_frame(&stream_id, &format, &[], -1, true))?;
            handle.block_on(client.flush())?;
            info!("Stream {} input ended after {} chunks, draining", stream_id, sent);

            let drained = handle.block_on(tokio::time::timeout(drain_timeout, reader));
            if drained.is_err() {
                warn!("Stream {} drain timed out after {:?}", stream_id, drain_timeout);
            }

            if callbacks.error_reported() {
                debug!("Stream {} ended after reporting an error", stream_id);
            }
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Aborts the response reader when the worker body exits, on any path
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn read_responses(mut subscriber: async_nats::Subscriber, callbacks: Arc<StreamCallbacks>) {
    let mut responses = 0usize;

    while let Some(msg) = subscriber.next().await {
        responses += 1;

        let reply: TranslatedAudioMessage = match serde_json::from_slice(&msg.payload) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Failed to parse translated audio message: {}", e);
                continue;
            }
        };

        if let Some(err) = &reply.error {
            callbacks.error(format!("Translation error: {}", err));
            break;
        }

        if !reply.pcm.is_empty() {
            match decode_pcm(&reply) {
                Ok(pcm) => callbacks.audio(pcm),
                Err(e) => warn!("Response {}: {:#}", responses, e),
            }
        } else {
            debug!("Response {}: no audio", responses);
        }

        if reply.final_frame {
            break;
        }
    }

    info!("Translation stream ended, {} responses", responses);
}
