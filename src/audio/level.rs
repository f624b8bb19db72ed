/// Normalized RMS level (0.0 to 1.0) of little-endian int16 PCM.
///
/// A trailing odd byte is ignored.
pub fn rms_level(pcm_bytes: &[u8]) -> f32 {
    let samples = pcm_bytes.len() / 2;
    if samples == 0 {
        return 0.0;
    }

    let sum_squares: f64 = pcm_bytes
        .chunks_exact(2)
        .map(|b| {
            let s = i16::from_le_bytes([b[0], b[1]]) as f64;
            s * s
        })
        .sum();

    let rms = (sum_squares / samples as f64).sqrt();
    (rms / i16::MAX as f64).min(1.0) as f32
}
