//! Spectral A-weighting filter
//!
//! Applies the IEC 61672 A-weighting response in the frequency domain:
//! forward FFT, per-bin gain from the analytic response curve, one-sided
//! weighted magnitudes out. The level estimator recovers the weighted RMS
//! from the spectrum via Parseval's relation, so no inverse transform is
//! needed.
//!
//! When the transform cannot complete (unsupported frame length or a
//! non-finite value in the output), the caller falls back to the
//! unweighted time-domain RMS path. That fallback is a designed degraded
//! mode, selected explicitly via [`WeightingMode`].

use rustfft::{num_complex::Complex, FftPlanner};

use crate::audio::AnalysisError;

/// Longest frame the spectral path will transform, in samples.
/// 200 ms at 192 kHz is 38400 samples; anything beyond this bound signals
/// a transform failure and takes the unweighted fallback.
pub const MAX_TRANSFORM_LEN: usize = 1 << 16;

/// Weighting path selected for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingMode {
    /// Spectral A-weighting (normal path)
    AWeighted,
    /// Unweighted time-domain RMS (degraded path)
    Fallback,
}

/// Unnormalized A-weighting magnitude response (IEC 61672-1)
fn response_magnitude(f: f64) -> f64 {
    let f2 = f * f;
    let num = 12194.0_f64.powi(2) * f2 * f2;
    let den = (f2 + 20.6_f64.powi(2))
        * ((f2 + 107.7_f64.powi(2)) * (f2 + 737.9_f64.powi(2))).sqrt()
        * (f2 + 12194.0_f64.powi(2));
    num / den
}

/// A-weighting gain in dB at the given frequency
///
/// Normalized so the gain at 1 kHz is exactly 0 dB, matching the standard
/// curve within ±1 dB across the audible band. Returns negative infinity
/// at 0 Hz (DC carries no perceived loudness).
///
/// # Example
/// ```
/// use noisewatch::audio::weighting::a_weighting_db;
///
/// assert!(a_weighting_db(1000.0).abs() < 1e-9);
/// assert!(a_weighting_db(50.0) < -25.0);
/// ```
pub fn a_weighting_db(frequency_hz: f64) -> f64 {
    if frequency_hz <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let norm = 20.0 * response_magnitude(1000.0).log10();
    20.0 * response_magnitude(frequency_hz).log10() - norm
}

/// Frequency-domain A-weighting filter
///
/// Owns an FFT planner so repeated frames of the same length reuse the
/// plan. The weighter carries no signal state: the output is a pure
/// function of the input samples and sample rate.
pub struct SpectralWeighter {
    planner: FftPlanner<f64>,
}

impl SpectralWeighter {
    /// Create a new weighter
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Apply A-weighting to a frame of samples
    ///
    /// # Arguments
    /// * `samples` - Normalized samples in [-1.0, 1.0]
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// The one-sided weighted magnitude spectrum (`len / 2 + 1` bins), or
    /// a [`AnalysisError::TransformFailure`] when the transform cannot
    /// complete. Pass the result to
    /// [`crate::audio::level::rms_from_spectrum`] for the weighted RMS.
    pub fn apply(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Vec<f64>, AnalysisError> {
        let n = samples.len();
        if n == 0 || n > MAX_TRANSFORM_LEN {
            return Err(AnalysisError::TransformFailure {
                reason: format!("unsupported frame length {}", n),
            });
        }

        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .map(|&x| Complex::new(x as f64, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let bins = n / 2 + 1;
        let bin_hz = sample_rate as f64 / n as f64;
        let mut magnitudes = Vec::with_capacity(bins);

        for (k, c) in buffer.iter().take(bins).enumerate() {
            // DC carries no weighted energy; all other bins are scaled by
            // the response at the bin center frequency.
            let weighted = if k == 0 {
                0.0
            } else {
                let gain = 10.0_f64.powf(a_weighting_db(k as f64 * bin_hz) / 20.0);
                c.norm() * gain
            };
            if !weighted.is_finite() {
                return Err(AnalysisError::TransformFailure {
                    reason: format!("non-finite magnitude at bin {}", k),
                });
            }
            magnitudes.push(weighted);
        }

        Ok(magnitudes)
    }
}

impl Default for SpectralWeighter {
    fn default() -> Self {
        Self::new()
    }
}
