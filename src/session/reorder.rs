//! Timestamp-ordered result release
//!
//! Analysis runs on several workers, so results can complete out of
//! capture order. The alert state machine requires non-decreasing
//! timestamps, so completed results pass through a small buffer keyed by
//! timestamp before delivery. The buffer holds at most `depth` entries
//! (worker count plus slack); once full, the oldest is released. A
//! straggler older than the last released timestamp cannot be delivered
//! without breaking ordering and is dropped with a warning.

use std::collections::BTreeMap;

use crate::audio::analyzer::AnalysisResult;

/// Reorder buffer in front of the alert state machine
pub struct ReorderBuffer {
    pending: BTreeMap<u64, AnalysisResult>,
    depth: usize,
    last_released_ms: Option<u64>,
    late_drops: u64,
}

impl ReorderBuffer {
    /// Create a buffer releasing results once more than `depth` are held
    pub fn new(depth: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            depth: depth.max(1),
            last_released_ms: None,
            late_drops: 0,
        }
    }

    /// Add a completed result, returning any results now ready for
    /// delivery in timestamp order
    pub fn push(&mut self, result: AnalysisResult) -> Vec<AnalysisResult> {
        if let Some(last) = self.last_released_ms {
            if result.timestamp_ms <= last {
                self.late_drops += 1;
                tracing::warn!(
                    timestamp_ms = result.timestamp_ms,
                    last_released_ms = last,
                    "late_result_dropped"
                );
                return Vec::new();
            }
        }

        self.pending.insert(result.timestamp_ms, result);

        let mut released = Vec::new();
        while self.pending.len() > self.depth {
            let (timestamp_ms, result) = self.pending.pop_first().expect("len checked");
            self.last_released_ms = Some(timestamp_ms);
            released.push(result);
        }
        released
    }

    /// Drain everything still pending, in timestamp order (shutdown)
    pub fn flush(&mut self) -> Vec<AnalysisResult> {
        let mut released = Vec::with_capacity(self.pending.len());
        while let Some((timestamp_ms, result)) = self.pending.pop_first() {
            self.last_released_ms = Some(timestamp_ms);
            released.push(result);
        }
        released
    }

    /// Results dropped for arriving after their slot was released
    pub fn late_drops(&self) -> u64 {
        self.late_drops
    }

    /// Results currently held back
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
