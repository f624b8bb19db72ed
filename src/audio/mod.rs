pub mod chunk;
pub mod level;

pub use chunk::{is_expected_size, AudioChunk};
pub use level::rms_level;
