//! Spectral band-energy analysis with FFT

pub mod fft;
pub mod analysis;
pub mod readout;

pub use fft::FftEngine;
pub use analysis::{analyze, AnalyzerConfig, BandEnergy, StressAnalyzer, StressError};
pub use readout::StressReading;
