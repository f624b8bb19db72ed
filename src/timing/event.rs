use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline checkpoint at which a timing sample is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Client chunk arrived on the socket (assigns the chunk index)
    AudioReceived,
    /// Chunk handed to the translation service by the relay consumer
    AudioToService,
    /// Translated audio returned by the service (worker thread)
    AudioFromService,
    /// Translated audio written to the client socket
    AudioSentToClient,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AudioReceived => "audio_received",
            Stage::AudioToService => "audio_to_service",
            Stage::AudioFromService => "audio_from_service",
            Stage::AudioSentToClient => "audio_sent_to_client",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timing measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingEvent {
    pub stage: Stage,

    /// Seconds since the Unix epoch
    pub timestamp: f64,

    /// Chunk index, or -1 for events not tied to a client chunk
    pub chunk_index: i64,

    /// Nominal playback position of the chunk in the source audio
    pub source_position_sec: f64,

    #[serde(rename = "audio_bytes_len")]
    pub byte_length: usize,

    /// Seconds since the test started
    pub wall_clock: f64,
}
