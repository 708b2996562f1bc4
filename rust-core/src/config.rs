//! TOML configuration
//!
//! Every key is optional; missing keys fall back to the built-in defaults.

use crate::spectrum::AnalyzerConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalyzerConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptureConfig {
    /// Ring buffer size in whole blocks
    #[serde(default = "default_buffer_blocks")]
    pub buffer_blocks: usize,
    /// Refuse input devices not running at this rate
    #[serde(default)]
    pub required_sample_rate: Option<u32>,
    /// Input device name; the system default when unset
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            buffer_blocks: default_buffer_blocks(),
            required_sample_rate: None,
            device: None,
        }
    }
}

fn default_buffer_blocks() -> usize { 16 }

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Config::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.analysis.block_len, 2048);
        assert_eq!(config.analysis.sample_rate, 44100);
        assert_eq!(config.analysis.band_low_hz, 8.0);
        assert_eq!(config.analysis.band_high_hz, 14.0);
        assert_eq!(config.analysis.gain, 5.0);
        assert_eq!(config.capture.buffer_blocks, 16);
        assert!(config.capture.required_sample_rate.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [analysis]
            gain = 3.5
            band_high_hz = 12.0

            [capture]
            required_sample_rate = 44100
            device = "USB Mic"
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.gain, 3.5);
        assert_eq!(config.analysis.band_high_hz, 12.0);
        assert_eq!(config.analysis.band_low_hz, 8.0);
        assert_eq!(config.analysis.block_len, 2048);
        assert_eq!(config.capture.required_sample_rate, Some(44100));
        assert_eq!(config.capture.device.as_deref(), Some("USB Mic"));
        assert_eq!(config.capture.buffer_blocks, 16);
    }

    #[test]
    fn test_bad_types_are_parse_errors() {
        let err = Config::from_toml("[analysis]\nblock_len = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nsample_rate = 48000").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.analysis.sample_rate, 48000);

        assert!(matches!(
            load_config("/nonexistent/voice-stress.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
