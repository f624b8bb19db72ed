use super::messages::{AudioFrameMessage, TranslatedAudioMessage};
use anyhow::{Context, Result};
use async_nats::connection::State;
use async_nats::Client;
use base64::Engine;
use tracing::{debug, info};

/// Audio format and language pair attached to every published frame
#[derive(Debug, Clone)]
pub struct FrameFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub source_language: String,
    pub target_language: String,
    pub model: String,
}

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.client.connection_state(), State::Connected)
    }

    pub fn input_subject(stream_id: &str) -> String {
        format!("s2s.audio.in.{}", stream_id)
    }

    pub fn output_subject(stream_id: &str) -> String {
        format!("s2s.audio.out.{}", stream_id)
    }

    /// Publish one client audio chunk for a translation stream
    pub async fn publish_audio_frame(
        &self,
        stream_id: &str,
        format: &FrameFormat,
        pcm_bytes: &[u8],
        chunk_index: i64,
        is_final: bool,
    ) -> Result<()> {
        let subject = Self::input_subject(stream_id);

        let message = AudioFrameMessage {
            stream_id: stream_id.to_string(),
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate: format.sample_rate,
            channels: format.channels,
            source_language: format.source_language.clone(),
            target_language: format.target_language.clone(),
            model: format.model.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame: is_final,
            chunk_index,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (chunk={}, bytes={}, final={})",
            subject,
            chunk_index,
            pcm_bytes.len(),
            is_final
        );

        Ok(())
    }

    /// Subscribe to translated audio for one stream
    pub async fn subscribe_translated_audio(&self, stream_id: &str) -> Result<async_nats::Subscriber> {
        let subject = Self::output_subject(stream_id);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to translated audio")?;

        info!("Subscribed to {}", subject);

        Ok(subscriber)
    }

    pub async fn flush(&self) -> Result<()> {
        self.client.flush().await.context("Failed to flush NATS connection")
    }
}

/// Decode the base64 PCM payload of a translated audio message
pub fn decode_pcm(message: &TranslatedAudioMessage) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(&message.pcm)
        .context("Invalid base64 PCM in translated audio")
}
