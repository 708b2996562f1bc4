//! FFT engine using realfft for real-valued sample blocks
//!
//! Plans are shared process-wide; scratch buffers are allocated per call so
//! one engine can be used from several threads at once.

use num_complex::Complex;
use realfft::{FftError, RealFftPlanner, RealToComplex};
use std::sync::{Arc, Mutex, OnceLock};

/// Process-wide plan cache. realfft keeps one plan per length internally.
static PLANNER: OnceLock<Mutex<RealFftPlanner<f64>>> = OnceLock::new();

fn plan_forward(fft_size: usize) -> Arc<dyn RealToComplex<f64>> {
    let planner = PLANNER.get_or_init(|| Mutex::new(RealFftPlanner::new()));
    // A poisoned planner still holds valid, immutable plans.
    let mut guard = planner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.plan_fft_forward(fft_size)
}

/// Forward FFT for real-valued blocks of a fixed size
#[derive(Clone)]
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT plan (immutable, shared)
    r2c: Arc<dyn RealToComplex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        Self {
            fft_size,
            r2c: plan_forward(fft_size),
        }
    }

    /// Compute the complex spectrum of a block
    ///
    /// `signal` must hold exactly `fft_size` samples; shorter or longer
    /// input is reported by realfft as a length error.
    ///
    /// # Returns
    /// Complex bins X[k] for k = 0..=fft_size/2
    pub fn compute_spectrum(&self, signal: &[f64]) -> Result<Vec<Complex<f64>>, FftError> {
        let mut input = signal.to_vec();
        let mut output = self.r2c.make_output_vec();
        let mut scratch = self.r2c.make_scratch_vec();
        self.r2c
            .process_with_scratch(&mut input, &mut output, &mut scratch)?;

        Ok(output)
    }

    /// Compute FFT and return magnitude spectrum
    ///
    /// # Returns
    /// Magnitude spectrum |X[k]| for k = 0..=fft_size/2 (positive frequencies only)
    pub fn compute_magnitude(&self, signal: &[f64]) -> Result<Vec<f64>, FftError> {
        let spectrum = self.compute_spectrum(signal)?;
        Ok(spectrum.iter().map(|c| c.norm()).collect())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Centre frequency of a bin in Hz: `bin * sample_rate / fft_size`
    pub fn bin_to_hz(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.fft_size as f64
    }

    /// Frequency spacing between adjacent bins in Hz
    pub fn resolution_hz(&self, sample_rate: f64) -> f64 {
        sample_rate / self.fft_size as f64
    }
}

impl std::fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine")
            .field("fft_size", &self.fft_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_dc_signal() {
        let fft = FftEngine::new(1024);

        let signal = vec![1.0; 1024];
        let spectrum = fft.compute_magnitude(&signal).unwrap();

        // All energy lands in the DC bin
        assert!((spectrum[0] - 1024.0).abs() < 1e-9);
        assert!(spectrum[10] < 1e-9);
    }

    #[test]
    fn test_fft_sine_on_bin() {
        let fft = FftEngine::new(1024);

        // Exactly 32 periods per block
        let signal: Vec<f64> = (0..1024)
            .map(|n| (2.0 * PI * 32.0 * n as f64 / 1024.0).sin())
            .collect();

        let spectrum = fft.compute_magnitude(&signal).unwrap();

        let (peak_bin, &peak_mag) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        assert_eq!(peak_bin, 32);
        // Unit sine puts N/2 into its bin
        assert!((peak_mag - 512.0).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_length_is_an_error() {
        let fft = FftEngine::new(1024);
        assert!(fft.compute_magnitude(&[0.0; 100]).is_err());
    }

    #[test]
    fn test_bin_frequencies() {
        let fft = FftEngine::new(2048);

        assert_eq!(fft.num_bins(), 1025);
        assert_eq!(fft.bin_to_hz(0, 44100.0), 0.0);
        assert!((fft.bin_to_hz(1, 44100.0) - 21.533203125).abs() < 1e-12);
        assert!((fft.resolution_hz(2048.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_engines_share_plans_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    let fft = FftEngine::new(512);
                    fft.compute_magnitude(&vec![0.5; 512]).unwrap()[0]
                })
            })
            .collect();

        for handle in handles {
            assert!((handle.join().unwrap() - 256.0).abs() < 1e-9);
        }
    }
}
