use serde::{Deserialize, Serialize};

/// Client audio frame published to the translation service
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub stream_id: String,
    pub pcm: String, // Base64-encoded int16 PCM
    pub sample_rate: u32,
    pub channels: u16,
    pub source_language: String,
    pub target_language: String,
    pub model: String,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
    pub chunk_index: i64,
}

/// Translated audio (or a failure) returned by the translation service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslatedAudioMessage {
    pub stream_id: String,
    #[serde(default)]
    pub pcm: String, // Base64-encoded int16 PCM
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "final", default)]
    pub final_frame: bool,
    #[serde(default)]
    pub error: Option<String>,
}
