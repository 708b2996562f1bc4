//! Microtremor band-energy analyzer
//!
//! Scores a block of samples by the share of its magnitude spectrum that
//! falls inside the 8–14 Hz microtremor band, scaled by a fixed gain and
//! clamped to 1.0.

use super::fft::FftEngine;
use super::readout::StressReading;
use serde::Deserialize;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Samples per analysis block
pub const DEFAULT_BLOCK_LEN: usize = 2048;

/// Sample rate assumed when none is configured (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Lower edge of the microtremor band (Hz, inclusive)
pub const DEFAULT_BAND_LOW_HZ: f64 = 8.0;

/// Upper edge of the microtremor band (Hz, inclusive)
pub const DEFAULT_BAND_HIGH_HZ: f64 = 14.0;

/// Empirical gain mapping typical band ratios into [0, 1]
pub const DEFAULT_GAIN: f64 = 5.0;

/// Usable-bin energy at or below this share of the whole spectrum is FFT
/// rounding residue. One PCM16 step on a full-scale offset is still ~1e-5.
pub const SILENCE_TOLERANCE: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StressError {
    #[error("Sample block has {actual} samples, expected {expected}")]
    InvalidBlockLength { expected: usize, actual: usize },

    #[error("Sample rate must be positive (got {0} Hz)")]
    InvalidSampleRate(u32),

    #[error("Sample {index} is not a finite number")]
    NonFiniteSample { index: usize },

    #[error("Invalid analyzer configuration: {0}")]
    InvalidConfig(String),

    #[error("FFT processing failed: {0}")]
    Transform(String),
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzerConfig {
    /// Block length N (samples per analysis)
    #[serde(default = "default_block_len")]
    pub block_len: usize,

    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Lower band edge in Hz (inclusive)
    #[serde(default = "default_band_low_hz")]
    pub band_low_hz: f64,

    /// Upper band edge in Hz (inclusive)
    #[serde(default = "default_band_high_hz")]
    pub band_high_hz: f64,

    /// Multiplier applied to the band ratio before clamping
    #[serde(default = "default_gain")]
    pub gain: f64,
}

fn default_block_len() -> usize { DEFAULT_BLOCK_LEN }
fn default_sample_rate() -> u32 { DEFAULT_SAMPLE_RATE }
fn default_band_low_hz() -> f64 { DEFAULT_BAND_LOW_HZ }
fn default_band_high_hz() -> f64 { DEFAULT_BAND_HIGH_HZ }
fn default_gain() -> f64 { DEFAULT_GAIN }

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            block_len: DEFAULT_BLOCK_LEN,
            sample_rate: DEFAULT_SAMPLE_RATE,
            band_low_hz: DEFAULT_BAND_LOW_HZ,
            band_high_hz: DEFAULT_BAND_HIGH_HZ,
            gain: DEFAULT_GAIN,
        }
    }
}

impl AnalyzerConfig {
    /// Same configuration at a different sample rate
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..self.clone()
        }
    }

    /// Check that the configuration can produce bounded scores
    pub fn validate(&self) -> Result<(), StressError> {
        if self.block_len < 2 {
            return Err(StressError::InvalidConfig(format!(
                "block_len must be at least 2 (got {})",
                self.block_len
            )));
        }
        if self.sample_rate == 0 {
            return Err(StressError::InvalidSampleRate(self.sample_rate));
        }
        let band_ok = self.band_low_hz.is_finite()
            && self.band_high_hz.is_finite()
            && self.band_low_hz >= 0.0
            && self.band_low_hz <= self.band_high_hz;
        if !band_ok {
            return Err(StressError::InvalidConfig(format!(
                "band {}..{} Hz is not a valid frequency range",
                self.band_low_hz, self.band_high_hz
            )));
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(StressError::InvalidConfig(format!(
                "gain must be a non-negative number (got {})",
                self.gain
            )));
        }
        Ok(())
    }
}

/// Magnitude sums over the usable bins of one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEnergy {
    /// Sum of magnitudes inside the band
    pub band: f64,

    /// Sum of magnitudes over bins [1, N/2)
    pub total: f64,

    /// Largest `total` still treated as FFT rounding residue
    pub silence_floor: f64,
}

impl BandEnergy {
    /// Band share of the total, or `None` when the usable bins hold only
    /// rounding residue (silence or a DC-only block)
    pub fn ratio(&self) -> Option<f64> {
        if self.total > self.silence_floor {
            Some(self.band / self.total)
        } else {
            None
        }
    }
}

/// Stateless microtremor stress analyzer
///
/// Holds only immutable configuration and a shared FFT plan, so a single
/// analyzer can be used from several threads.
#[derive(Debug, Clone)]
pub struct StressAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,
    band_bins: Option<RangeInclusive<usize>>,
}

impl StressAnalyzer {
    /// Create new stress analyzer
    pub fn new(config: AnalyzerConfig) -> Result<Self, StressError> {
        config.validate()?;

        let fft_engine = FftEngine::new(config.block_len);
        let band_bins = band_bin_range(&fft_engine, &config);

        match &band_bins {
            Some(bins) => log::debug!(
                "Band {}-{} Hz covers bins {}..={} ({:.3} Hz/bin)",
                config.band_low_hz,
                config.band_high_hz,
                bins.start(),
                bins.end(),
                fft_engine.resolution_hz(config.sample_rate as f64)
            ),
            None => log::warn!(
                "No bin falls inside {}-{} Hz at {} Hz / {} samples ({:.3} Hz/bin); scores will always be 0",
                config.band_low_hz,
                config.band_high_hz,
                config.sample_rate,
                config.block_len,
                fft_engine.resolution_hz(config.sample_rate as f64)
            ),
        }

        Ok(Self {
            config,
            fft_engine,
            band_bins,
        })
    }

    /// Sum band and total magnitudes for one block
    pub fn band_energy(&self, samples: &[f64]) -> Result<BandEnergy, StressError> {
        self.check_block(samples)?;

        let magnitude = self
            .fft_engine
            .compute_magnitude(samples)
            .map_err(|e| StressError::Transform(e.to_string()))?;

        // DC and Nyquist are left out
        let usable = &magnitude[1..self.config.block_len / 2];
        let total: f64 = usable.iter().sum();
        let band: f64 = match &self.band_bins {
            Some(bins) => magnitude[bins.clone()].iter().sum(),
            None => 0.0,
        };

        // Residue scales with the block's level, including the excluded DC bin
        let spectrum_sum: f64 = magnitude.iter().sum();
        let silence_floor = spectrum_sum * SILENCE_TOLERANCE;

        Ok(BandEnergy {
            band,
            total,
            silence_floor,
        })
    }

    /// Analyze one block and return its stress reading
    ///
    /// A block with no spectral energy scores 0.0 and is flagged silent.
    pub fn analyze(&self, samples: &[f64]) -> Result<StressReading, StressError> {
        let energy = self.band_energy(samples)?;

        let reading = match energy.ratio() {
            Some(ratio) => StressReading::new((ratio * self.config.gain).min(1.0)),
            None => {
                log::trace!("Silent block, using fallback score");
                StressReading::silent()
            }
        };

        Ok(reading)
    }

    /// Bins counted as inside the band, if any
    pub fn band_bins(&self) -> Option<RangeInclusive<usize>> {
        self.band_bins.clone()
    }

    /// Frequency of every usable bin in Hz (bins 1..N/2)
    pub fn frequency_bins_hz(&self) -> Vec<f64> {
        let sample_rate = self.config.sample_rate as f64;
        (1..self.config.block_len / 2)
            .map(|bin| self.fft_engine.bin_to_hz(bin, sample_rate))
            .collect()
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn check_block(&self, samples: &[f64]) -> Result<(), StressError> {
        if samples.len() != self.config.block_len {
            return Err(StressError::InvalidBlockLength {
                expected: self.config.block_len,
                actual: samples.len(),
            });
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(StressError::NonFiniteSample { index });
        }
        Ok(())
    }
}

/// Score a block of [`DEFAULT_BLOCK_LEN`] samples with the default band and gain
pub fn analyze(samples: &[f64], sample_rate: u32) -> Result<f64, StressError> {
    let config = AnalyzerConfig {
        sample_rate,
        ..AnalyzerConfig::default()
    };
    let analyzer = StressAnalyzer::new(config)?;
    Ok(analyzer.analyze(samples)?.score())
}

/// Bins in [1, N/2) whose centre frequency lies inside the band
fn band_bin_range(fft_engine: &FftEngine, config: &AnalyzerConfig) -> Option<RangeInclusive<usize>> {
    let sample_rate = config.sample_rate as f64;
    let mut inside = (1..config.block_len / 2).filter(|&bin| {
        let freq = fft_engine.bin_to_hz(bin, sample_rate);
        freq >= config.band_low_hz && freq <= config.band_high_hz
    });

    let first = inside.next()?;
    let last = inside.last().unwrap_or(first);
    Some(first..=last)
}
