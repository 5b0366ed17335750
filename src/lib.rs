//! Noisewatch Core - Real-time occupational noise hazard monitoring
//!
//! This library provides the analysis and alerting core for a noise
//! monitoring application. It converts a stream of captured audio frames
//! into calibrated, A-weighted sound pressure levels and drives a
//! debounced hazard alert state machine with repeat-vibration cadence.
//!
//! Audio capture, settings persistence, and the notification/vibration
//! platform APIs are external collaborators; this crate only consumes
//! frames and emits results and alert events over channels. No audio is
//! ever recorded, stored, or transmitted.

pub mod alert;
pub mod audio;
pub mod config;
pub mod degrade;
pub mod session;
pub mod stats;

pub use alert::{AlertEvent, AlertState, AlertStateMachine};
pub use audio::analyzer::{AnalysisResult, FrameAnalyzer};
pub use audio::frame::AudioFrame;
pub use audio::weighting::WeightingMode;
pub use config::{ConfigError, MonitorConfig, VibrationPattern};
pub use degrade::{CaptureStatus, DegradationController, ResourcePressure};
pub use session::MonitorSession;
pub use stats::SessionStats;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum accepted capture sample rate in Hz
pub const MIN_SAMPLE_RATE: u32 = 44100;

/// Soft per-frame analysis budget in milliseconds. Exceeding it completes
/// the analysis anyway and flags the result as an overrun.
pub const ANALYSIS_BUDGET_MS: u64 = 100;

/// End-to-end budget from frame capture to a surfaced alert, in milliseconds
pub const ALERT_DEADLINE_MS: u64 = 500;
