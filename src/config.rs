//! Monitoring configuration supplied by the settings layer
//!
//! The settings UI and its persistence live outside this crate; what
//! arrives here is a plain value that must pass `validate()` before a
//! session will accept it. Out-of-range values are rejected with a typed
//! error, never clamped, so the caller can keep its previous valid
//! configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_threshold_db() -> f64 {
    85.0
}

fn default_frame_duration_ms() -> u64 {
    100
}

fn default_vibration_enabled() -> bool {
    true
}

fn default_vibration_pattern() -> VibrationPattern {
    VibrationPattern::default()
}

fn default_repeat_interval_ms() -> u64 {
    5000
}

fn default_deactivation_hold_ms() -> u64 {
    1000
}

/// Errors produced when a configuration value is outside its valid range
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("safety threshold {0} dB outside 70-120 dB")]
    ThresholdOutOfRange(String),

    #[error("frame duration {0} ms outside 100-200 ms")]
    FrameDurationOutOfRange(u64),

    #[error("calibration offset {0} dB outside -20-20 dB")]
    CalibrationOutOfRange(String),

    #[error("vibration pattern must have a non-zero pulse duration")]
    EmptyVibrationPulse,

    #[error("vibration repeat interval must be non-zero")]
    ZeroRepeatInterval,

    #[error("deactivation hold time must be non-zero")]
    ZeroDeactivationHold,
}

/// Haptic pulse pattern forwarded verbatim to the platform vibration API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationPattern {
    /// Duration of each pulse in milliseconds
    pub pulse_ms: u64,
    /// Pause between pulses in milliseconds
    pub pause_ms: u64,
    /// Number of pulses per vibration event
    pub pulses: u32,
}

impl Default for VibrationPattern {
    fn default() -> Self {
        Self {
            pulse_ms: 400,
            pause_ms: 200,
            pulses: 3,
        }
    }
}

/// Monitoring configuration
///
/// All fields carry serde defaults so a partially populated settings
/// document deserializes to a usable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Hazard classification threshold in dB SPL (70-120)
    #[serde(default = "default_threshold_db")]
    pub threshold_db: f64,
    /// Requested capture frame duration in milliseconds (100-200)
    #[serde(default = "default_frame_duration_ms")]
    pub frame_duration_ms: u64,
    /// Additive calibration offset in dB (-20-20), applied after conversion
    #[serde(default)]
    pub calibration_offset_db: f64,
    /// Whether hazard alerts emit haptic pulses
    #[serde(default = "default_vibration_enabled")]
    pub vibration_enabled: bool,
    /// Pulse pattern for each vibration event
    #[serde(default = "default_vibration_pattern")]
    pub vibration_pattern: VibrationPattern,
    /// Minimum interval between vibration events while an alert is active
    #[serde(default = "default_repeat_interval_ms")]
    pub repeat_interval_ms: u64,
    /// How long the level must stay below threshold before the alert clears
    #[serde(default = "default_deactivation_hold_ms")]
    pub deactivation_hold_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold_db: default_threshold_db(),
            frame_duration_ms: default_frame_duration_ms(),
            calibration_offset_db: 0.0,
            vibration_enabled: default_vibration_enabled(),
            vibration_pattern: default_vibration_pattern(),
            repeat_interval_ms: default_repeat_interval_ms(),
            deactivation_hold_ms: default_deactivation_hold_ms(),
        }
    }
}

impl MonitorConfig {
    /// Check every field against its valid range
    ///
    /// # Returns
    /// The first violation found, or `Ok(())` when the configuration is
    /// acceptable. Values are never adjusted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(70.0..=120.0).contains(&self.threshold_db) {
            return Err(ConfigError::ThresholdOutOfRange(format!(
                "{:.1}",
                self.threshold_db
            )));
        }
        if !(100..=200).contains(&self.frame_duration_ms) {
            return Err(ConfigError::FrameDurationOutOfRange(self.frame_duration_ms));
        }
        if !(-20.0..=20.0).contains(&self.calibration_offset_db) {
            return Err(ConfigError::CalibrationOutOfRange(format!(
                "{:.1}",
                self.calibration_offset_db
            )));
        }
        if self.vibration_pattern.pulse_ms == 0 || self.vibration_pattern.pulses == 0 {
            return Err(ConfigError::EmptyVibrationPulse);
        }
        if self.repeat_interval_ms == 0 {
            return Err(ConfigError::ZeroRepeatInterval);
        }
        if self.deactivation_hold_ms == 0 {
            return Err(ConfigError::ZeroDeactivationHold);
        }
        Ok(())
    }
}
