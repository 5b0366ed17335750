//! Alert state machine driving visual and haptic side effects
//!
//! Two states, `INACTIVE` and `ACTIVE`, driven by a strictly time-ordered
//! stream of analysis results. Activation is immediate on the first
//! hazardous result; deactivation requires the level to stay below the
//! threshold continuously for the configured hold time, so a single
//! transient safe reading never flickers the alert off. Vibration repeats
//! at the configured interval while the alert stays active.
//!
//! All timing runs on stream timestamps (the capture clock), which makes
//! every transition deterministic and replay-testable. The machine must
//! be driven by exactly one logical thread of control; transitions are
//! not commutative.

use crate::audio::analyzer::AnalysisResult;
use crate::config::{MonitorConfig, VibrationPattern};

/// Side effects the consumer must surface
///
/// `Activate` must reach the user within 500 ms of the originating
/// frame's capture timestamp; the consumer owns that budget once the
/// event is emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    /// Show the hazard alert
    Activate { db_level: f64, timestamp_ms: u64 },
    /// Refresh the displayed level while the alert is active
    Update { db_level: f64 },
    /// Fire one haptic pulse pattern
    Vibrate { pattern: VibrationPattern },
    /// Hide the hazard alert
    Clear,
}

/// Snapshot of the alert machine's state
///
/// Invariants: `alert_start_ms` is `Some` iff `active`;
/// `last_vibration_ms` is `Some` only while `active`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertState {
    /// Whether the hazard alert is currently shown
    pub active: bool,
    /// Level currently displayed by the alert, dB SPL
    pub current_db: f64,
    /// Timestamp of the result that activated the alert
    pub alert_start_ms: Option<u64>,
    /// Timestamp of the most recent vibration event
    pub last_vibration_ms: Option<u64>,
    /// Hazardous results counted during the current activation
    pub hazard_frames: u64,
}

/// Hazard alert state machine
///
/// One instance per monitoring session. [`AlertStateMachine::reset`]
/// returns it to the initial inactive state on session stop or restart.
#[derive(Debug)]
pub struct AlertStateMachine {
    state: AlertState,
    /// Timestamp of the first safe result in the current below-threshold
    /// run; cleared whenever a hazardous result arrives
    safe_since_ms: Option<u64>,
    config: MonitorConfig,
}

impl AlertStateMachine {
    /// Create a machine in the `INACTIVE` state
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            state: AlertState::default(),
            safe_since_ms: None,
            config,
        }
    }

    /// Feed the next analysis result, in timestamp order
    ///
    /// # Returns
    /// The side effects this result caused, in emission order.
    pub fn on_result(&mut self, result: &AnalysisResult) -> Vec<AlertEvent> {
        let now = result.timestamp_ms;
        let mut events = Vec::new();

        if result.hazardous {
            self.safe_since_ms = None;
            self.state.hazard_frames += 1;

            if self.state.active {
                self.state.current_db = result.db_level;
                events.push(AlertEvent::Update {
                    db_level: result.db_level,
                });
            } else {
                self.state.active = true;
                self.state.alert_start_ms = Some(now);
                self.state.current_db = result.db_level;
                tracing::info!(db = result.db_level, timestamp_ms = now, "alert_activated");
                events.push(AlertEvent::Activate {
                    db_level: result.db_level,
                    timestamp_ms: now,
                });
            }

            if self.config.vibration_enabled && self.vibration_due(now) {
                self.state.last_vibration_ms = Some(now);
                events.push(AlertEvent::Vibrate {
                    pattern: self.config.vibration_pattern.clone(),
                });
            }
        } else if self.state.active {
            // Level keeps tracking for display; activation state and the
            // vibration timer are untouched until the hold elapses.
            self.state.current_db = result.db_level;
            events.push(AlertEvent::Update {
                db_level: result.db_level,
            });

            let safe_since = *self.safe_since_ms.get_or_insert(now);
            if now.saturating_sub(safe_since) >= self.config.deactivation_hold_ms {
                self.deactivate();
                events.push(AlertEvent::Clear);
            }
        }

        events
    }

    /// Force the machine back to `INACTIVE` (session stop or restart)
    ///
    /// # Returns
    /// The final `Clear` event when the alert was active, `None` otherwise.
    pub fn reset(&mut self) -> Option<AlertEvent> {
        let was_active = self.state.active;
        self.state = AlertState::default();
        self.safe_since_ms = None;
        if was_active {
            tracing::info!("alert_reset");
            Some(AlertEvent::Clear)
        } else {
            None
        }
    }

    /// Current state snapshot for the UI boundary
    pub fn snapshot(&self) -> AlertState {
        self.state.clone()
    }

    fn vibration_due(&self, now: u64) -> bool {
        match self.state.last_vibration_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.config.repeat_interval_ms,
        }
    }

    fn deactivate(&mut self) {
        tracing::info!(
            hazard_frames = self.state.hazard_frames,
            "alert_deactivated"
        );
        self.state = AlertState::default();
        self.safe_since_ms = None;
    }
}
