//! Lock-free status published by the worker loops.
//!
//! Every field is a single atomic so that status reads never wait on the
//! control lock, the camera or the engine. The gaze point is packed as two
//! `f32` halves of one `u64` so readers never observe a torn point.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use serde::Serialize;

use super::SessionState;
use crate::{
    calibration::{CalibrationProgress, CalibrationState},
    geometry::Point,
    zones::Zone,
};

/// Why the last loop ended abnormally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopError {
    /// Camera could not be opened
    CameraUnavailable,
    /// Camera stopped delivering frames mid-loop
    CameraLost,
}

impl LoopError {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CameraUnavailable => "camera_unavailable",
            Self::CameraLost => "camera_lost",
        }
    }
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    /// Which activity holds the camera
    pub state: SessionState,
    /// Last smoothed gaze point, origin before the first estimate
    pub gaze: Point,
    /// Zone under the gaze
    pub zone: Zone,
    /// Progress of the running or most recent calibration
    pub calibration_progress: Option<CalibrationProgress>,
    /// Final state of the most recent calibration
    pub calibration_result: Option<CalibrationState>,
    /// Abnormal end of the most recent loop
    pub last_error: Option<LoopError>,
}

const NO_PROGRESS: u64 = u64::MAX;
const NONE_CODE: u8 = 0;

#[derive(Debug)]
pub(crate) struct StatusCell {
    state: AtomicU8,
    gaze: AtomicU64,
    zone: AtomicU8,
    progress: AtomicU64,
    calibration_result: AtomicU8,
    last_error: AtomicU8,
}

impl Default for StatusCell {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(state_code(SessionState::Idle)),
            gaze: AtomicU64::new(pack_point(Point::default())),
            zone: AtomicU8::new(Zone::None.to_u8()),
            progress: AtomicU64::new(NO_PROGRESS),
            calibration_result: AtomicU8::new(NONE_CODE),
            last_error: AtomicU8::new(NONE_CODE),
        }
    }
}

impl StatusCell {
    pub(crate) fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: state_from_code(self.state.load(Ordering::Acquire)),
            gaze: unpack_point(self.gaze.load(Ordering::Acquire)),
            zone: Zone::from_u8(self.zone.load(Ordering::Acquire)),
            calibration_progress: unpack_progress(self.progress.load(Ordering::Acquire)),
            calibration_result: calibration_from_code(self.calibration_result.load(Ordering::Acquire)),
            last_error: error_from_code(self.last_error.load(Ordering::Acquire)),
        }
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.store(state_code(state), Ordering::Release);
    }

    pub(crate) fn set_gaze(&self, gaze: Point) {
        self.gaze.store(pack_point(gaze), Ordering::Release);
    }

    pub(crate) fn set_zone(&self, zone: Zone) {
        self.zone.store(zone.to_u8(), Ordering::Release);
    }

    pub(crate) fn set_progress(&self, progress: CalibrationProgress) {
        self.progress.store(pack_progress(progress), Ordering::Release);
    }

    pub(crate) fn set_calibration_result(&self, result: Option<CalibrationState>) {
        self.calibration_result
            .store(result.map_or(NONE_CODE, calibration_code), Ordering::Release);
    }

    pub(crate) fn set_error(&self, error: Option<LoopError>) {
        let code = match error {
            None => NONE_CODE,
            Some(LoopError::CameraUnavailable) => 1,
            Some(LoopError::CameraLost) => 2,
        };
        self.last_error.store(code, Ordering::Release);
    }
}

const fn state_code(state: SessionState) -> u8 {
    match state {
        SessionState::Idle => 0,
        SessionState::Tracking => 1,
        SessionState::Calibrating => 2,
    }
}

const fn state_from_code(code: u8) -> SessionState {
    match code {
        1 => SessionState::Tracking,
        2 => SessionState::Calibrating,
        _ => SessionState::Idle,
    }
}

const fn calibration_code(state: CalibrationState) -> u8 {
    match state {
        CalibrationState::Idle => 1,
        CalibrationState::Active => 2,
        CalibrationState::Completed => 3,
        CalibrationState::Cancelled => 4,
        CalibrationState::TimedOut => 5,
    }
}

const fn calibration_from_code(code: u8) -> Option<CalibrationState> {
    match code {
        1 => Some(CalibrationState::Idle),
        2 => Some(CalibrationState::Active),
        3 => Some(CalibrationState::Completed),
        4 => Some(CalibrationState::Cancelled),
        5 => Some(CalibrationState::TimedOut),
        _ => None,
    }
}

const fn error_from_code(code: u8) -> Option<LoopError> {
    match code {
        1 => Some(LoopError::CameraUnavailable),
        2 => Some(LoopError::CameraLost),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)] // Screen coordinates fit in f32
fn pack_point(point: Point) -> u64 {
    (u64::from((point.x as f32).to_bits()) << 32) | u64::from((point.y as f32).to_bits())
}

#[allow(clippy::cast_possible_truncation)]
fn unpack_point(packed: u64) -> Point {
    Point::new(
        f64::from(f32::from_bits((packed >> 32) as u32)),
        f64::from(f32::from_bits(packed as u32)),
    )
}

fn pack_progress(progress: CalibrationProgress) -> u64 {
    let current = u32::try_from(progress.current).unwrap_or(u32::MAX - 1);
    let total = u32::try_from(progress.total).unwrap_or(u32::MAX - 1);
    (u64::from(current) << 32) | u64::from(total)
}

#[allow(clippy::cast_possible_truncation)]
fn unpack_progress(packed: u64) -> Option<CalibrationProgress> {
    (packed != NO_PROGRESS).then(|| CalibrationProgress {
        current: (packed >> 32) as usize,
        total: (packed as u32) as usize,
    })
}
