use crate::config::AudioConfig;

/// One unit of client audio on its way to the translation service.
///
/// The payload is opaque int16 PCM; `index` is the chunk index the timing
/// bus assigned on receipt (-1 when no test was active).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub index: i64,
    pub data: Vec<u8>,
}

impl AudioChunk {
    pub fn new(index: i64, data: Vec<u8>) -> Self {
        Self { index, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Check that a client chunk has the configured size
pub fn is_expected_size(data: &[u8], config: &AudioConfig) -> bool {
    data.len() == config.chunk_bytes()
}
