//! RMS and sound pressure level estimation
//!
//! Converts a weighted spectrum (or raw fallback samples) into a
//! calibrated dB SPL value. All accumulation is f64; the published value
//! is rounded to exactly one decimal.

use crate::audio::AnalysisError;

/// Reference pressure for dB SPL: 20 micropascals
pub const REFERENCE_PRESSURE: f64 = 20e-6;

/// RMS below this is treated as silence instead of producing -inf
pub const SILENCE_RMS: f64 = 1e-9;

/// Floor for reported levels in dB SPL
pub const MIN_DB: f64 = 0.0;

/// Reject samples that are non-finite or outside [-1.0, 1.0]
pub fn validate_samples(samples: &[f32]) -> Result<(), AnalysisError> {
    for (index, &value) in samples.iter().enumerate() {
        if !value.is_finite() || value.abs() > 1.0 {
            return Err(AnalysisError::InvalidSampleData {
                reason: format!("sample {} out of range: {}", index, value),
            });
        }
    }
    Ok(())
}

/// Root-mean-square of raw samples (unweighted fallback path)
pub fn rms_time_domain(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&x| x as f64 * x as f64).sum();
    (sum_squares / samples.len() as f64).sqrt()
}

/// Root-mean-square recovered from a one-sided magnitude spectrum
///
/// Parseval: `mean(x^2) = sum(|X_k|^2) / n^2` over the full spectrum. The
/// one-sided form counts every bin twice except DC and (for even `n`) the
/// Nyquist bin.
///
/// # Arguments
/// * `magnitudes` - One-sided magnitude spectrum, `n / 2 + 1` bins
/// * `frame_len` - Original frame length `n` the spectrum was computed from
pub fn rms_from_spectrum(magnitudes: &[f64], frame_len: usize) -> f64 {
    if magnitudes.is_empty() || frame_len == 0 {
        return 0.0;
    }
    let n = frame_len as f64;
    let nyquist_bin = if frame_len % 2 == 0 {
        Some(magnitudes.len() - 1)
    } else {
        None
    };

    let mut power = magnitudes[0] * magnitudes[0];
    for (k, &m) in magnitudes.iter().enumerate().skip(1) {
        let fold = if Some(k) == nyquist_bin { 1.0 } else { 2.0 };
        power += fold * m * m;
    }
    (power / (n * n)).sqrt()
}

/// Convert an RMS amplitude to dB SPL
///
/// `dB = 20 * log10(rms / 20 µPa)`. RMS below [`SILENCE_RMS`] is treated
/// as silence and reports [`MIN_DB`] rather than negative infinity.
pub fn rms_to_db_spl(rms: f64) -> f64 {
    if rms < SILENCE_RMS {
        return MIN_DB;
    }
    (20.0 * (rms / REFERENCE_PRESSURE).log10()).max(MIN_DB)
}

/// Round a dB value to exactly one decimal place
///
/// Uses half-away-from-zero (`f64::round` semantics): 84.25 rounds to
/// 84.3. This is the rule the hazard boundary tests pin.
pub fn round_db(db: f64) -> f64 {
    (db * 10.0).round() / 10.0
}

/// Full conversion: RMS → dB SPL → calibration offset → floor → rounding
pub fn calibrated_db(rms: f64, calibration_offset_db: f64) -> f64 {
    round_db((rms_to_db_spl(rms) + calibration_offset_db).max(MIN_DB))
}
