//! Per-frame acoustic analysis
//!
//! Raw PCM frames come in, calibrated A-weighted sound pressure levels
//! come out. The pipeline per frame is: validation ([`frame`]), spectral
//! weighting ([`weighting`]), level estimation ([`level`]), orchestrated
//! by [`analyzer::FrameAnalyzer`].

pub mod analyzer;
pub mod frame;
pub mod level;
pub mod weighting;

use thiserror::Error;

/// Errors raised on the per-frame analysis path
///
/// Neither variant is fatal: an invalid frame is skipped (downstream sees
/// a gap in the result stream), and a failed transform falls back to the
/// unweighted time-domain path with the result marked degraded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Frame failed validation (empty, sample rate too low, or samples
    /// that are non-finite / outside [-1.0, 1.0])
    #[error("invalid sample data: {reason}")]
    InvalidSampleData { reason: String },

    /// The frequency-domain weighting computation could not complete
    #[error("weighting transform failed: {reason}")]
    TransformFailure { reason: String },
}
