//! Minimal WAV loader for canonical mono PCM16 files
//!
//! Skips the fixed 44-byte canonical header and treats the rest of the file
//! as raw PCM16 LE. The header itself is not parsed, so the sample rate
//! comes from configuration.

use super::pcm::decode_pcm16_le;
use std::path::Path;
use thiserror::Error;

/// Size of the canonical RIFF/WAVE header
pub const WAV_HEADER_LEN: usize = 44;

#[derive(Error, Debug)]
pub enum WavError {
    #[error("Failed to read WAV file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is {0} bytes, shorter than the 44-byte WAV header")]
    Truncated(usize),

    #[error("Clip has {available} samples, need at least {required} for one block")]
    TooShort { required: usize, available: usize },
}

/// Decoded mono clip
#[derive(Debug, Clone)]
pub struct WavClip {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl WavClip {
    /// Load a WAV file from disk
    pub fn open<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self, WavError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let clip = Self::from_bytes(&bytes, sample_rate)?;

        log::info!(
            "Loaded {} ({} samples, {:.2} s at {} Hz)",
            path.display(),
            clip.len(),
            clip.duration_secs(),
            sample_rate
        );

        Ok(clip)
    }

    /// Decode a WAV image held in memory
    pub fn from_bytes(bytes: &[u8], sample_rate: u32) -> Result<Self, WavError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(WavError::Truncated(bytes.len()));
        }

        Ok(Self {
            samples: decode_pcm16_le(&bytes[WAV_HEADER_LEN..]),
            sample_rate,
        })
    }

    /// First `block_len` samples of the clip
    pub fn first_block(&self, block_len: usize) -> Result<&[f64], WavError> {
        self.samples
            .get(..block_len)
            .ok_or(WavError::TooShort {
                required: block_len,
                available: self.samples.len(),
            })
    }

    /// Iterate over whole blocks; a trailing partial block is skipped
    pub fn blocks(&self, block_len: usize) -> impl Iterator<Item = &[f64]> + '_ {
        self.samples.chunks_exact(block_len.max(1))
    }

    /// All decoded samples
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clip length in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn mono_pcm16(sample_rate: u32) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    /// Mono PCM16 WAV image as written by a standard encoder
    fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, mono_pcm16(sample_rate)).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        cursor.into_inner()
    }

    #[test]
    fn test_encoder_writes_canonical_header() {
        let image = encode_wav(&[1, 2, 3], 44100);

        assert_eq!(image.len(), WAV_HEADER_LEN + 6);
        assert_eq!(&image[..4], b"RIFF");
        assert_eq!(&image[36..40], b"data");
        assert_eq!(&image[40..44], &6u32.to_le_bytes());
    }

    #[test]
    fn test_header_is_skipped() {
        let image = encode_wav(&[16384, -32768, 0], 44100);
        let clip = WavClip::from_bytes(&image, 44100).unwrap();

        assert_eq!(clip.samples(), &[0.5, -1.0, 0.0]);
    }

    #[test]
    fn test_truncated_file() {
        let err = WavClip::from_bytes(&[0u8; 20], 44100).unwrap_err();
        assert!(matches!(err, WavError::Truncated(20)));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let clip = WavClip::from_bytes(&encode_wav(&[], 44100), 44100).unwrap();
        assert!(clip.is_empty());
        assert!(matches!(
            clip.first_block(2048),
            Err(WavError::TooShort { required: 2048, available: 0 })
        ));
    }

    #[test]
    fn test_blocks_drop_partial_tail() {
        let samples: Vec<i16> = (0..2500).map(|n| n as i16).collect();
        let clip = WavClip::from_bytes(&encode_wav(&samples, 8000), 8000).unwrap();

        let blocks: Vec<&[f64]> = clip.blocks(1000).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1][0], 1000.0 / 32768.0);
        assert_eq!(clip.first_block(1000).unwrap(), blocks[0]);
        assert!((clip.duration_secs() - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn test_open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let mut writer = hound::WavWriter::create(&path, mono_pcm16(44100)).unwrap();
        for _ in 0..4096 {
            writer.write_sample(8192i16).unwrap();
        }
        writer.finalize().unwrap();

        let clip = WavClip::open(&path, 44100).unwrap();
        assert_eq!(clip.len(), 4096);
        assert_eq!(clip.sample_rate(), 44100);
        assert!(clip.samples().iter().all(|&s| s == 0.25));
    }

    #[test]
    fn test_missing_file() {
        let err = WavClip::open("/nonexistent/clip.wav", 44100).unwrap_err();
        assert!(matches!(err, WavError::Io(_)));
    }
}
