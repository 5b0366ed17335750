//! Captured audio frame handed to the analyzer
//!
//! A frame is an owned block of normalized samples produced by the
//! external capture layer. The analyzer consumes frames by value and the
//! samples are dropped when the analysis call returns; nothing in this
//! crate retains raw audio past that point.

use crate::audio::AnalysisError;
use crate::MIN_SAMPLE_RATE;

/// One captured block of audio
///
/// # Example
/// ```
/// use noisewatch::AudioFrame;
///
/// let frame = AudioFrame::new(vec![0.0; 4800], 48000, 0);
/// assert_eq!(frame.duration_ms(), 100);
/// ```
#[derive(Clone)]
pub struct AudioFrame {
    samples: Vec<f32>,
    sample_rate: u32,
    timestamp_ms: u64,
}

impl AudioFrame {
    /// Create a frame from normalized samples
    ///
    /// # Arguments
    /// * `samples` - Normalized samples in [-1.0, 1.0]
    /// * `sample_rate` - Capture sample rate in Hz
    /// * `timestamp_ms` - Monotonic capture timestamp in milliseconds,
    ///   strictly increasing within a session
    pub fn new(samples: Vec<f32>, sample_rate: u32, timestamp_ms: u64) -> Self {
        Self {
            samples,
            sample_rate,
            timestamp_ms,
        }
    }

    /// Borrow the raw samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Capture sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Monotonic capture timestamp in milliseconds
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Frame duration in milliseconds, derived from the sample count
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Validate the frame before analysis
    ///
    /// Checks structure (non-empty, sample rate at least
    /// [`MIN_SAMPLE_RATE`]) and every sample for finiteness and range.
    /// A failed frame is skipped by the analyzer, not propagated.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.samples.is_empty() {
            return Err(AnalysisError::InvalidSampleData {
                reason: "empty frame".to_string(),
            });
        }
        if self.sample_rate < MIN_SAMPLE_RATE {
            return Err(AnalysisError::InvalidSampleData {
                reason: format!(
                    "sample rate {} below minimum {}",
                    self.sample_rate, MIN_SAMPLE_RATE
                ),
            });
        }
        crate::audio::level::validate_samples(&self.samples)
    }
}

// Samples are elided from Debug output so frames never leak into logs.
impl std::fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFrame")
            .field("len", &self.samples.len())
            .field("sample_rate", &self.sample_rate)
            .field("timestamp_ms", &self.timestamp_ms)
            .finish()
    }
}
