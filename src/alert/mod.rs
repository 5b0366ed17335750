//! Hazard alert state machine and its side-effect events

pub mod machine;

pub use machine::{AlertEvent, AlertState, AlertStateMachine};
