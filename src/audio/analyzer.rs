//! Per-frame analysis orchestration
//!
//! [`FrameAnalyzer`] runs one frame through validation, weighting, and
//! level estimation, then classifies the hazard. Each call is a pure
//! function of the frame, configuration, and weighting mode: identical
//! inputs produce identical levels regardless of call history or which
//! worker thread runs them. The only mutable state is the cached FFT
//! planner, which never affects the output.

use std::time::{Duration, Instant};

use crate::audio::frame::AudioFrame;
use crate::audio::level;
use crate::audio::weighting::{SpectralWeighter, WeightingMode};
use crate::audio::AnalysisError;
use crate::config::MonitorConfig;
use crate::ANALYSIS_BUDGET_MS;

/// Outcome of analyzing a single frame
///
/// Immutable once produced; consumers receive it by value or shared
/// reference and never mutate it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Calibrated A-weighted level in dB SPL, rounded to one decimal
    pub db_level: f64,
    /// True when `db_level` is at or above the configured threshold
    pub hazardous: bool,
    /// Capture timestamp of the source frame in milliseconds
    pub timestamp_ms: u64,
    /// Wall-clock time the analysis took
    pub processing: Duration,
    /// True when the unweighted fallback path produced the level
    pub degraded: bool,
    /// True when processing exceeded the analysis budget
    pub overrun: bool,
}

/// Analyzer for captured audio frames
///
/// One instance per worker thread; instances share nothing.
pub struct FrameAnalyzer {
    weighter: SpectralWeighter,
}

impl FrameAnalyzer {
    /// Create a new analyzer
    pub fn new() -> Self {
        Self {
            weighter: SpectralWeighter::new(),
        }
    }

    /// Analyze one frame
    ///
    /// The frame is consumed; its samples are released before the result
    /// is returned and are not retained anywhere in the analyzer.
    ///
    /// # Arguments
    /// * `frame` - The captured frame (consumed)
    /// * `config` - Active monitoring configuration
    /// * `mode` - Weighting path selected by the degradation controller
    ///
    /// # Returns
    /// The analysis result, or [`AnalysisError::InvalidSampleData`] when
    /// the frame must be skipped. A transform failure is handled
    /// internally by falling back to the unweighted path and marking the
    /// result degraded; it is never returned to the caller.
    pub fn analyze(
        &mut self,
        frame: AudioFrame,
        config: &MonitorConfig,
        mode: WeightingMode,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let timestamp_ms = frame.timestamp_ms();

        if let Err(e) = frame.validate() {
            tracing::warn!(timestamp_ms, error = %e, "frame_skipped");
            return Err(e);
        }

        let (rms, degraded) = match mode {
            WeightingMode::Fallback => (level::rms_time_domain(frame.samples()), true),
            WeightingMode::AWeighted => {
                match self.weighter.apply(frame.samples(), frame.sample_rate()) {
                    Ok(magnitudes) => (
                        level::rms_from_spectrum(&magnitudes, frame.samples().len()),
                        false,
                    ),
                    Err(e) => {
                        tracing::warn!(timestamp_ms, error = %e, "weighting_fallback");
                        (level::rms_time_domain(frame.samples()), true)
                    }
                }
            }
        };

        // Raw samples are released here, before the result leaves the call.
        drop(frame);

        let db_level = level::calibrated_db(rms, config.calibration_offset_db);
        let hazardous = db_level >= config.threshold_db;

        let processing = started.elapsed();
        let overrun = processing.as_millis() as u64 > ANALYSIS_BUDGET_MS;
        if overrun {
            tracing::warn!(
                timestamp_ms,
                processing_ms = processing.as_millis() as u64,
                "analysis_overrun"
            );
        }

        Ok(AnalysisResult {
            db_level,
            hazardous,
            timestamp_ms,
            processing,
            degraded,
            overrun,
        })
    }
}

impl Default for FrameAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
