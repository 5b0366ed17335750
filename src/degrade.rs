//! Degradation policy for sustained resource pressure
//!
//! Watches the result stream for sustained analysis overruns and repeated
//! weighting fallbacks, and listens for externally reported memory or
//! thermal pressure. Under pressure it trades fidelity for throughput:
//! larger capture frames (fewer analyses per second) and the unweighted
//! fallback path. Hazard classification itself is never disabled, and
//! recovery is automatic once the pressure clears.

use crate::audio::analyzer::AnalysisResult;
use crate::audio::weighting::WeightingMode;
use crate::config::MonitorConfig;

/// Consecutive overruns before the frame duration is stepped up
pub const OVERRUN_STREAK: u32 = 5;

/// Consecutive weighting fallbacks before the spectral path is abandoned
pub const TRANSFORM_FAILURE_STREAK: u32 = 3;

/// Consecutive clean results before one recovery step is taken
pub const RECOVERY_STREAK: u32 = 25;

/// Frame duration adjustment step in milliseconds
pub const FRAME_STEP_MS: u64 = 25;

/// Upper bound on the capture frame duration
pub const MAX_FRAME_DURATION_MS: u64 = 200;

/// Capture pipeline status reported by the external audio processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    Capturing,
    Error,
    PermissionDenied,
}

/// Externally reported resource pressure signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePressure {
    LowMemory,
    Thermal,
}

/// The controller's current recommendation to the rest of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradationPlan {
    /// Frame duration the capture layer should use
    pub frame_duration_ms: u64,
    /// Weighting path the analysis workers should use
    pub mode: WeightingMode,
}

/// Degradation controller
///
/// Owned by the session's sequential consumer; fed every delivered result.
#[derive(Debug)]
pub struct DegradationController {
    base_frame_duration_ms: u64,
    frame_duration_ms: u64,
    mode: WeightingMode,
    overrun_streak: u32,
    fallback_streak: u32,
    clean_streak: u32,
    low_memory: bool,
    thermal: bool,
    capture_status: CaptureStatus,
}

impl DegradationController {
    /// Create a controller at full fidelity
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            base_frame_duration_ms: config.frame_duration_ms,
            frame_duration_ms: config.frame_duration_ms,
            mode: WeightingMode::AWeighted,
            overrun_streak: 0,
            fallback_streak: 0,
            clean_streak: 0,
            low_memory: false,
            thermal: false,
            capture_status: CaptureStatus::Idle,
        }
    }

    /// Record one delivered result and apply the policy
    pub fn record_result(&mut self, result: &AnalysisResult) {
        if result.overrun {
            self.overrun_streak += 1;
            self.clean_streak = 0;
        } else if result.degraded && self.mode == WeightingMode::AWeighted {
            // The worker fell back on its own: the transform failed.
            self.fallback_streak += 1;
            self.clean_streak = 0;
        } else {
            self.overrun_streak = 0;
            self.fallback_streak = 0;
            self.clean_streak += 1;
        }

        if self.overrun_streak >= OVERRUN_STREAK {
            self.overrun_streak = 0;
            self.step_frame_up("sustained analysis overruns");
        }

        if self.fallback_streak >= TRANSFORM_FAILURE_STREAK {
            self.fallback_streak = 0;
            self.force_fallback("repeated transform failures");
        }

        if self.clean_streak >= RECOVERY_STREAK && !self.external_pressure() {
            self.clean_streak = 0;
            self.recover_one_step();
        }
    }

    /// Assert or clear an external pressure signal
    ///
    /// Asserting forces the fallback path and steps the frame duration up
    /// immediately. Recovery happens through the normal clean-streak path
    /// once every signal is cleared.
    pub fn set_pressure(&mut self, pressure: ResourcePressure, asserted: bool) {
        let flag = match pressure {
            ResourcePressure::LowMemory => &mut self.low_memory,
            ResourcePressure::Thermal => &mut self.thermal,
        };
        if *flag == asserted {
            return;
        }
        *flag = asserted;

        if asserted {
            tracing::warn!(signal = ?pressure, "resource_pressure_asserted");
            self.step_frame_up("external resource pressure");
            self.force_fallback("external resource pressure");
        } else {
            tracing::info!(signal = ?pressure, "resource_pressure_cleared");
        }
    }

    /// Observe the capture status reported by the audio processor
    pub fn set_capture_status(&mut self, status: CaptureStatus) {
        if status != self.capture_status {
            tracing::info!(status = ?status, "capture_status_changed");
            self.capture_status = status;
        }
    }

    /// Current recommendation
    pub fn plan(&self) -> DegradationPlan {
        DegradationPlan {
            frame_duration_ms: self.frame_duration_ms,
            mode: self.mode,
        }
    }

    /// True while any fidelity or throughput trade is in effect
    pub fn is_degraded(&self) -> bool {
        self.mode == WeightingMode::Fallback
            || self.frame_duration_ms != self.base_frame_duration_ms
    }

    fn external_pressure(&self) -> bool {
        self.low_memory || self.thermal
    }

    fn step_frame_up(&mut self, cause: &str) {
        let stepped = (self.frame_duration_ms + FRAME_STEP_MS).min(MAX_FRAME_DURATION_MS);
        if stepped != self.frame_duration_ms {
            self.frame_duration_ms = stepped;
            tracing::warn!(frame_duration_ms = stepped, cause, "degraded_frame_duration");
        }
    }

    fn force_fallback(&mut self, cause: &str) {
        if self.mode != WeightingMode::Fallback {
            self.mode = WeightingMode::Fallback;
            tracing::warn!(cause, "degraded_weighting_fallback");
        }
    }

    /// One recovery step: restore the weighted path first, then shrink
    /// the frame duration back toward the configured value.
    fn recover_one_step(&mut self) {
        if self.mode == WeightingMode::Fallback {
            self.mode = WeightingMode::AWeighted;
            tracing::info!("recovered_weighting");
        } else if self.frame_duration_ms > self.base_frame_duration_ms {
            self.frame_duration_ms =
                (self.frame_duration_ms - FRAME_STEP_MS).max(self.base_frame_duration_ms);
            tracing::info!(
                frame_duration_ms = self.frame_duration_ms,
                "recovered_frame_duration"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(overrun: bool, degraded: bool) -> AnalysisResult {
        AnalysisResult {
            db_level: 70.0,
            hazardous: false,
            timestamp_ms: 0,
            processing: Duration::from_millis(if overrun { 150 } else { 5 }),
            degraded,
            overrun,
        }
    }

    fn controller() -> DegradationController {
        DegradationController::new(&MonitorConfig::default())
    }

    #[test]
    fn test_starts_at_full_fidelity() {
        let controller = controller();
        let plan = controller.plan();
        assert_eq!(plan.frame_duration_ms, 100);
        assert_eq!(plan.mode, WeightingMode::AWeighted);
        assert!(!controller.is_degraded());
    }

    #[test]
    fn test_clean_results_change_nothing() {
        let mut controller = controller();
        for _ in 0..100 {
            controller.record_result(&result(false, false));
        }
        assert!(!controller.is_degraded());
    }

    #[test]
    fn test_sustained_overruns_grow_frames() {
        let mut controller = controller();
        for _ in 0..OVERRUN_STREAK {
            controller.record_result(&result(true, false));
        }
        assert_eq!(controller.plan().frame_duration_ms, 125);
        assert!(controller.is_degraded());

        // Pressure keeps escalating toward the bound, never past it
        for _ in 0..OVERRUN_STREAK * 10 {
            controller.record_result(&result(true, false));
        }
        assert_eq!(controller.plan().frame_duration_ms, MAX_FRAME_DURATION_MS);
    }

    #[test]
    fn test_overrun_streak_broken_by_clean_result() {
        let mut controller = controller();
        for _ in 0..OVERRUN_STREAK - 1 {
            controller.record_result(&result(true, false));
        }
        controller.record_result(&result(false, false));
        controller.record_result(&result(true, false));
        assert_eq!(
            controller.plan().frame_duration_ms,
            100,
            "streak must be consecutive"
        );
    }

    #[test]
    fn test_repeated_transform_failures_force_fallback() {
        let mut controller = controller();
        for _ in 0..TRANSFORM_FAILURE_STREAK {
            controller.record_result(&result(false, true));
        }
        assert_eq!(controller.plan().mode, WeightingMode::Fallback);
    }

    #[test]
    fn test_degraded_results_while_forced_count_as_clean() {
        let mut controller = controller();
        for _ in 0..TRANSFORM_FAILURE_STREAK {
            controller.record_result(&result(false, true));
        }
        assert_eq!(controller.plan().mode, WeightingMode::Fallback);

        // While forced into fallback every result is degraded by design;
        // they feed the clean streak and eventually re-probe the
        // weighted path.
        for _ in 0..RECOVERY_STREAK {
            controller.record_result(&result(false, true));
        }
        assert_eq!(controller.plan().mode, WeightingMode::AWeighted);
    }

    #[test]
    fn test_recovery_restores_mode_then_duration() {
        let mut controller = controller();
        // Degrade both axes
        for _ in 0..OVERRUN_STREAK {
            controller.record_result(&result(true, false));
        }
        for _ in 0..TRANSFORM_FAILURE_STREAK {
            controller.record_result(&result(false, true));
        }
        assert_eq!(controller.plan().frame_duration_ms, 125);
        assert_eq!(controller.plan().mode, WeightingMode::Fallback);

        // First recovery step restores weighting
        for _ in 0..RECOVERY_STREAK {
            controller.record_result(&result(false, true));
        }
        assert_eq!(controller.plan().mode, WeightingMode::AWeighted);
        assert_eq!(controller.plan().frame_duration_ms, 125);

        // Second restores the frame duration
        for _ in 0..RECOVERY_STREAK {
            controller.record_result(&result(false, false));
        }
        assert_eq!(controller.plan().frame_duration_ms, 100);
        assert!(!controller.is_degraded());
    }

    #[test]
    fn test_external_pressure_degrades_immediately() {
        let mut controller = controller();
        controller.set_pressure(ResourcePressure::Thermal, true);

        let plan = controller.plan();
        assert_eq!(plan.frame_duration_ms, 125);
        assert_eq!(plan.mode, WeightingMode::Fallback);
    }

    #[test]
    fn test_no_recovery_while_pressure_asserted() {
        let mut controller = controller();
        controller.set_pressure(ResourcePressure::LowMemory, true);

        for _ in 0..RECOVERY_STREAK * 2 {
            controller.record_result(&result(false, true));
        }
        assert_eq!(
            controller.plan().mode,
            WeightingMode::Fallback,
            "recovery must wait for the pressure signal to clear"
        );

        controller.set_pressure(ResourcePressure::LowMemory, false);
        for _ in 0..RECOVERY_STREAK * 2 {
            controller.record_result(&result(false, false));
        }
        assert!(!controller.is_degraded());
    }

    #[test]
    fn test_reasserting_same_pressure_does_not_stack() {
        let mut controller = controller();
        controller.set_pressure(ResourcePressure::Thermal, true);
        controller.set_pressure(ResourcePressure::Thermal, true);
        controller.set_pressure(ResourcePressure::Thermal, true);
        assert_eq!(controller.plan().frame_duration_ms, 125);
    }

    #[test]
    fn test_capture_status_is_observed() {
        let mut controller = controller();
        controller.set_capture_status(CaptureStatus::Capturing);
        controller.set_capture_status(CaptureStatus::Error);
        // Status alone never changes the plan; it is observational
        assert!(!controller.is_degraded());
    }
}
