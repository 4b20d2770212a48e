//! Supervised calibration: target generation and the per-frame sequencer.
//!
//! A calibration session walks the user through an ordered set of fixation
//! targets. The gaze engine reports, frame by frame, the point it believes
//! the user reached; the sequencer debounces those reports and advances
//! until every target is covered, the session is cancelled, or the deadline
//! passes.

/// Calibration state machine
pub mod sequencer;

/// Target layouts
pub mod targets;

pub use sequencer::{Acceptance, CalibrationProgress, CalibrationSequencer, CalibrationState, Rejection};
pub use targets::{generate_targets, CalibrationLayout, CalibrationTarget};
