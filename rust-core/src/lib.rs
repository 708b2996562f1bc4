//! Voice Stress - microtremor band-energy analysis
//!
//! Scores blocks of mono PCM audio by the share of spectral energy in the
//! 8–14 Hz band, from WAV files or a live microphone.

pub mod audio;
pub mod config;
pub mod spectrum;

pub use config::{load_config, CaptureConfig, Config};
pub use spectrum::{analyze, AnalyzerConfig, StressAnalyzer, StressError, StressReading};
pub use audio::{StressMonitor, WavClip};
