//! 16-bit signed little-endian PCM conversion

/// Bytes per 16-bit sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Full-scale divisor mapping i16 onto [-1.0, 1.0)
const FULL_SCALE: f64 = 32768.0;

/// Decode PCM16 LE bytes into normalized samples
///
/// A trailing odd byte is ignored.
pub fn decode_pcm16_le(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f64 / FULL_SCALE)
        .collect()
}

/// Convert a float sample to i16, clamping to the representable range
pub fn float_to_pcm16(sample: f32) -> i16 {
    let scaled = (sample as f64 * FULL_SCALE).round();
    scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Normalize a signed 16-bit device sample
pub fn i16_to_float(sample: i16) -> f32 {
    sample as f32 / FULL_SCALE as f32
}

/// Normalize an offset-binary unsigned 16-bit device sample (midpoint 32768)
pub fn u16_to_float(sample: u16) -> f32 {
    (sample as f32 - FULL_SCALE as f32) / FULL_SCALE as f32
}

/// Encode float samples as PCM16 LE bytes
pub fn encode_pcm16_le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    encode_pcm16_le_into(samples, &mut bytes);
    bytes
}

/// Encode float samples as PCM16 LE into a reused buffer
///
/// `out` is cleared first; its capacity is kept.
pub fn encode_pcm16_le_into(samples: &[f32], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(samples.len() * BYTES_PER_SAMPLE);
    for &s in samples {
        out.extend_from_slice(&float_to_pcm16(s).to_le_bytes());
    }
}
