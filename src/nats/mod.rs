pub mod client;
pub mod messages;

pub use client::{decode_pcm, FrameFormat, NatsClient};
pub use messages::{AudioFrameMessage, TranslatedAudioMessage};
