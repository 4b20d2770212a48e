use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Serialize;

use super::targets::CalibrationTarget;
use crate::geometry::Point;

/// Lifecycle of a calibration session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationState {
    /// Created, not started
    Idle,
    /// Accepting candidate points
    Active,
    /// Every target was reached
    Completed,
    /// Stopped by an external request
    Cancelled,
    /// Deadline passed before completion
    TimedOut,
}

impl CalibrationState {
    /// True for the states a session never leaves
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::TimedOut)
    }
}

/// Why a candidate point did not advance the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Session is not active
    Inactive,
    /// Engine produced no estimate this frame
    NoCandidate,
    /// Non-finite point or the origin sentinel
    InvalidPoint,
    /// Same point as the last accepted one
    Duplicate,
}

/// Outcome of feeding one candidate point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Target reached, session moved on to `next_index`
    Advanced {
        /// Index of the next target to visit
        next_index: usize,
    },
    /// Last target reached
    Completed,
    /// Candidate ignored
    Rejected(Rejection),
}

/// Progress of a session, `current` of `total` targets reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CalibrationProgress {
    /// Targets reached so far
    pub current: usize,
    /// Targets in the session
    pub total: usize,
}

impl CalibrationProgress {
    /// Reached fraction in `[0, 1]`; an empty session counts as done
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// State machine driving one calibration session
#[derive(Debug)]
pub struct CalibrationSequencer {
    state: CalibrationState,
    targets: Vec<CalibrationTarget>,
    total: usize,
    current_index: usize,
    last_accepted: Option<Point>,
    acceptance_radius: f64,
    timeout: Duration,
    started_at: Option<Instant>,
    deadline: Option<Instant>,
}

impl CalibrationSequencer {
    /// Create an idle session over `targets` that times out `timeout` after start
    #[must_use]
    pub fn new(targets: Vec<CalibrationTarget>, timeout: Duration) -> Self {
        let acceptance_radius = targets.first().map_or(0.0, |t| t.acceptance_radius);
        Self {
            state: CalibrationState::Idle,
            total: targets.len(),
            targets,
            current_index: 0,
            last_accepted: None,
            acceptance_radius,
            timeout,
            started_at: None,
            deadline: None,
        }
    }

    /// Enter `Active`; the deadline counts from `now`
    pub fn start(&mut self, now: Instant) -> CalibrationState {
        if self.state != CalibrationState::Idle {
            return self.state;
        }
        self.state = CalibrationState::Active;
        self.started_at = Some(now);
        self.deadline = Some(now + self.timeout);
        info!("Calibration started with {} targets", self.total);

        if self.total == 0 {
            self.finish(CalibrationState::Completed);
        }
        self.state
    }

    /// Feed the engine's candidate point for the current target.
    ///
    /// A candidate advances the session only when it is a finite point away
    /// from the origin sentinel and differs, at pixel resolution, from the
    /// last accepted point.
    pub fn observe(&mut self, candidate: Option<Point>, acceptance_radius: f64, now: Instant) -> Acceptance {
        if self.tick(now) != CalibrationState::Active {
            return Acceptance::Rejected(Rejection::Inactive);
        }
        if acceptance_radius.is_finite() && acceptance_radius > 0.0 {
            self.acceptance_radius = acceptance_radius;
        }

        let Some(point) = candidate else {
            return Acceptance::Rejected(Rejection::NoCandidate);
        };
        if !point.is_finite() {
            return Acceptance::Rejected(Rejection::InvalidPoint);
        }
        let (px, py) = point.to_pixel();
        if px <= 0 || py <= 0 {
            return Acceptance::Rejected(Rejection::InvalidPoint);
        }
        if self.last_accepted.is_some_and(|last| last.to_pixel() == (px, py)) {
            return Acceptance::Rejected(Rejection::Duplicate);
        }

        self.current_index += 1;
        self.last_accepted = Some(point);
        debug!(
            "Calibration point {}/{} at ({}, {})",
            self.current_index, self.total, px, py
        );

        if self.current_index >= self.total {
            self.finish(CalibrationState::Completed);
            Acceptance::Completed
        } else {
            Acceptance::Advanced {
                next_index: self.current_index,
            }
        }
    }

    /// Apply the deadline; returns the state after the check
    pub fn tick(&mut self, now: Instant) -> CalibrationState {
        if self.state == CalibrationState::Active && self.deadline.is_some_and(|deadline| now >= deadline) {
            self.finish(CalibrationState::TimedOut);
        }
        self.state
    }

    /// Cancel from any non-terminal state
    pub fn cancel(&mut self) -> CalibrationState {
        if !self.state.is_terminal() {
            self.finish(CalibrationState::Cancelled);
        }
        self.state
    }

    fn finish(&mut self, state: CalibrationState) {
        self.state = state;
        self.targets = Vec::new();
        info!(
            "Calibration finished as {:?} ({}/{})",
            state, self.current_index, self.total
        );
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> CalibrationState {
        self.state
    }

    /// Target to look at next, `None` once the session is over
    #[must_use]
    pub fn current_target(&self) -> Option<&CalibrationTarget> {
        if self.state == CalibrationState::Active {
            self.targets.get(self.current_index)
        } else {
            None
        }
    }

    /// Index of the next target
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Last point that advanced the session
    #[must_use]
    pub const fn last_accepted(&self) -> Option<Point> {
        self.last_accepted
    }

    /// Most recent acceptance radius reported for the current target
    #[must_use]
    pub const fn acceptance_radius(&self) -> f64 {
        self.acceptance_radius
    }

    /// Targets reached out of the session total
    #[must_use]
    pub const fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            current: self.current_index,
            total: self.total,
        }
    }

    /// Instant the session entered `Active`
    #[must_use]
    pub const fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Instant the session times out
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Targets still held by the session; empty once terminal
    #[must_use]
    pub fn targets(&self) -> &[CalibrationTarget] {
        &self.targets
    }
}
