//! Stress readings and their percentage display

use std::fmt;

/// Label shown before any block has been analyzed
pub const PLACEHOLDER_LABEL: &str = "Stress: -- %";

/// Result of analyzing one sample block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressReading {
    score: f64,
    silent: bool,
}

impl StressReading {
    /// Reading for a block with spectral energy; `score` is clamped to [0, 1]
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            silent: false,
        }
    }

    /// Fallback reading for a block with no spectral energy
    pub fn silent() -> Self {
        Self {
            score: 0.0,
            silent: true,
        }
    }

    /// Stress score in [0, 1]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Whether the silence fallback produced this reading
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Score as a truncated percentage (0–100)
    pub fn percent(&self) -> u8 {
        (self.score * 100.0) as u8
    }

    /// Display label, e.g. `Stress: 42 %`
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StressReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stress: {} %", self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_truncates() {
        assert_eq!(StressReading::new(0.999).percent(), 99);
        assert_eq!(StressReading::new(0.426).percent(), 42);
        assert_eq!(StressReading::new(1.0).percent(), 100);
        assert_eq!(StressReading::new(0.0).percent(), 0);
    }

    #[test]
    fn test_label_format() {
        assert_eq!(StressReading::new(0.5).label(), "Stress: 50 %");
        assert_eq!(StressReading::silent().label(), "Stress: 0 %");
        assert_eq!(PLACEHOLDER_LABEL, "Stress: -- %");
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        assert_eq!(StressReading::new(3.0).score(), 1.0);
        assert_eq!(StressReading::new(-0.5).score(), 0.0);
    }
}
