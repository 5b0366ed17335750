//! Session-level counters
//!
//! Counter-only observability for the embedding layer: how many frames
//! were analyzed, dropped, or skipped, and what the alert machinery did.
//! No per-frame levels or audio are ever stored here.

use chrono::{DateTime, Utc};

/// Running counters for one monitoring session
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// Results delivered to the alert machine
    pub frames_analyzed: u64,
    /// Frames dropped by queue backpressure before analysis
    pub frames_dropped: u64,
    /// Frames skipped because their samples failed validation
    pub frames_skipped: u64,
    /// Results that exceeded the analysis budget
    pub overruns: u64,
    /// Results produced on the fallback path
    pub degraded_results: u64,
    /// Results discarded by the merge stage for arriving too late
    pub late_results_dropped: u64,
    /// Alert activations
    pub activations: u64,
    /// Vibration events emitted
    pub vibrations: u64,
}

impl SessionStats {
    /// Fresh counters stamped with the current time
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            frames_analyzed: 0,
            frames_dropped: 0,
            frames_skipped: 0,
            overruns: 0,
            degraded_results: 0,
            late_results_dropped: 0,
            activations: 0,
            vibrations: 0,
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_start_at_zero() {
        let stats = SessionStats::new();
        assert_eq!(stats.frames_analyzed, 0);
        assert_eq!(stats.frames_dropped, 0);
        assert_eq!(stats.activations, 0);
        assert!(stats.started_at <= Utc::now());
    }
}
