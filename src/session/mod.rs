//! Session orchestration: tracking and calibration over one shared camera.
//!
//! The controller owns the only camera source and hands it to at most one
//! worker loop at a time. All transitions go through one control lock and
//! its condition variable:
//!
//! - `start_tracking` reserves the `Tracking` state under the lock before
//!   the camera is opened, so concurrent callers cannot both start a loop.
//! - `start_calibration` preempts tracking by raising the tracking loop's
//!   stop flag and waiting, bounded by the grace period, for the loop to
//!   release the camera. While it waits a handoff flag keeps tracking from
//!   being restarted underneath it.
//! - Worker loops report their exit under the same lock and wake waiters.
//!
//! Status reads never take the control lock; see [`status`].

/// Lock-free status cell
pub mod status;

mod worker;

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::{
    config::Config,
    engine::{CameraGuard, CameraSource, GazeEngine},
    filters::GazeFilter,
    geometry::ScreenRoi,
    region::{create_estimator, GazeBuffer},
    Result,
};
pub use status::{LoopError, StatusSnapshot};
use status::StatusCell;

/// Which activity currently owns the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Camera free
    Idle,
    /// Continuous gaze tracking
    Tracking,
    /// Calibration session
    Calibrating,
}

impl SessionState {
    /// Status name reported by the control API
    #[must_use]
    pub const fn as_status(self) -> &'static str {
        match self {
            Self::Idle => "ready",
            Self::Tracking => "tracking",
            Self::Calibrating => "calibrating",
        }
    }
}

/// Result of a tracking start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new tracking loop owns the camera
    Started,
    /// Tracking or calibration already holds the camera
    AlreadyRunning,
    /// The camera could not be opened
    CameraUnavailable,
    /// The controller is shutting down
    ShuttingDown,
}

impl StartOutcome {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::AlreadyRunning => "already_running",
            Self::CameraUnavailable => "camera_unavailable",
            Self::ShuttingDown => "shutting_down",
        }
    }
}

/// Result of a tracking stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Tracking is stopping or was not running
    Stopped,
}

impl StopOutcome {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        "stopped"
    }
}

/// Result of a calibration start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// A calibration loop owns the camera
    Started,
    /// A calibration session is already running or pending
    AlreadyCalibrating,
    /// Tracking did not release the camera within the grace period
    ResourceBusy,
    /// The camera could not be opened
    CameraUnavailable,
}

impl CalibrationOutcome {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "calibration_started",
            Self::AlreadyCalibrating => "already_calibrating",
            Self::ResourceBusy => "resource_busy",
            Self::CameraUnavailable => "camera_unavailable",
        }
    }
}

/// Result of a calibration cancel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The running session was asked to cancel
    Cancelled,
    /// No calibration was running
    NotCalibrating,
}

impl CancelOutcome {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "calibration_cancelled",
            Self::NotCalibrating => "not_calibrating",
        }
    }
}

#[derive(Debug)]
struct Control {
    state: SessionState,
    pending_calibration: bool,
    shutting_down: bool,
    tracking_stop: Option<Arc<AtomicBool>>,
    calibration_cancel: Option<Arc<AtomicBool>>,
}

pub(crate) struct Shared {
    config: Config,
    engine: Mutex<Box<dyn GazeEngine>>,
    filter: Mutex<Box<dyn GazeFilter>>,
    cameras: Arc<dyn CameraSource>,
    control: Mutex<Control>,
    changed: Condvar,
    status: StatusCell,
    buffer: Mutex<GazeBuffer>,
    live_loops: AtomicUsize,
    peak_live_loops: AtomicUsize,
}

/// Locks ignore poisoning; every guarded value stays consistent across a panic
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the session; cheap to clone and share across threads
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    /// Create an idle controller
    pub fn new(config: Config, engine: Box<dyn GazeEngine>, cameras: Arc<dyn CameraSource>) -> Result<Self> {
        config.validate()?;
        let filter = config.create_filter()?;
        info!(
            "Session controller ready: engine {}, {}, filter {}",
            engine.name(),
            cameras.describe(),
            filter.name()
        );

        Ok(Self {
            shared: Arc::new(Shared {
                buffer: Mutex::new(GazeBuffer::new(config.clustering.buffer_capacity)),
                config,
                engine: Mutex::new(engine),
                filter: Mutex::new(filter),
                cameras,
                control: Mutex::new(Control {
                    state: SessionState::Idle,
                    pending_calibration: false,
                    shutting_down: false,
                    tracking_stop: None,
                    calibration_cancel: None,
                }),
                changed: Condvar::new(),
                status: StatusCell::default(),
                live_loops: AtomicUsize::new(0),
                peak_live_loops: AtomicUsize::new(0),
            }),
        })
    }

    /// Configuration the controller runs with
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Start continuous tracking if the camera is free
    pub fn start_tracking(&self) -> StartOutcome {
        let stop = {
            let mut control = lock(&self.shared.control);
            if control.shutting_down {
                return StartOutcome::ShuttingDown;
            }
            if control.state != SessionState::Idle || control.pending_calibration {
                debug!("Tracking start refused, session is {:?}", control.state);
                return StartOutcome::AlreadyRunning;
            }
            let stop = Arc::new(AtomicBool::new(false));
            control.state = SessionState::Tracking;
            control.tracking_stop = Some(Arc::clone(&stop));
            self.shared.status.set_state(SessionState::Tracking);
            self.shared.status.set_error(None);
            stop
        };
        let reservation = Reservation::new(&self.shared);

        let camera = match CameraGuard::acquire(self.shared.cameras.as_ref()) {
            Ok(camera) => camera,
            Err(e) => {
                warn!("Tracking could not open the camera: {}", e);
                return StartOutcome::CameraUnavailable;
            }
        };

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("gaze-tracking".to_string())
            .spawn(move || worker::run_tracking(&shared, camera, &stop));
        match spawned {
            Ok(_) => {
                reservation.hand_off();
                info!("Tracking started");
                StartOutcome::Started
            }
            Err(e) => {
                error!("Failed to spawn tracking loop: {}", e);
                StartOutcome::CameraUnavailable
            }
        }
    }

    /// Ask the tracking loop to stop; returns without waiting for it
    pub fn stop_tracking(&self) -> StopOutcome {
        let control = lock(&self.shared.control);
        if control.state == SessionState::Tracking {
            if let Some(stop) = &control.tracking_stop {
                stop.store(true, Ordering::Release);
                info!("Tracking stop requested");
            }
        }
        StopOutcome::Stopped
    }

    /// Start a calibration session, preempting tracking if it runs.
    ///
    /// Blocks for at most the configured grace period while a running
    /// tracking loop releases the camera. On `ResourceBusy` the stop request
    /// to tracking stays in force.
    pub fn start_calibration(&self) -> CalibrationOutcome {
        let grace = self.shared.config.session.preemption_grace();
        let (cancel, resume_tracking) = {
            let mut control = lock(&self.shared.control);
            if control.state == SessionState::Calibrating || control.pending_calibration {
                return CalibrationOutcome::AlreadyCalibrating;
            }
            if control.shutting_down {
                return CalibrationOutcome::ResourceBusy;
            }

            let was_tracking = control.state == SessionState::Tracking;
            if was_tracking {
                control.pending_calibration = true;
                if let Some(stop) = &control.tracking_stop {
                    stop.store(true, Ordering::Release);
                }
                info!("Preempting tracking for calibration");

                let deadline = Instant::now() + grace;
                while control.state != SessionState::Idle {
                    let now = Instant::now();
                    if now >= deadline {
                        control.pending_calibration = false;
                        drop(control);
                        self.shared.changed.notify_all();
                        warn!("Tracking did not release the camera within {:?}", grace);
                        return CalibrationOutcome::ResourceBusy;
                    }
                    control = self
                        .shared
                        .changed
                        .wait_timeout(control, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
                control.pending_calibration = false;
                if control.shutting_down {
                    drop(control);
                    self.shared.changed.notify_all();
                    return CalibrationOutcome::ResourceBusy;
                }
            }

            let cancel = Arc::new(AtomicBool::new(false));
            control.state = SessionState::Calibrating;
            control.calibration_cancel = Some(Arc::clone(&cancel));
            self.shared.status.set_state(SessionState::Calibrating);
            self.shared.status.set_error(None);
            self.shared.status.set_calibration_result(None);
            (cancel, was_tracking)
        };
        let reservation = Reservation::new(&self.shared);

        let camera = match CameraGuard::acquire(self.shared.cameras.as_ref()) {
            Ok(camera) => camera,
            Err(e) => {
                warn!("Calibration could not open the camera: {}", e);
                return CalibrationOutcome::CameraUnavailable;
            }
        };

        let controller = self.clone();
        let spawned = thread::Builder::new()
            .name("gaze-calibration".to_string())
            .spawn(move || worker::run_calibration(&controller, camera, &cancel, resume_tracking));
        match spawned {
            Ok(_) => {
                reservation.hand_off();
                info!("Calibration started");
                CalibrationOutcome::Started
            }
            Err(e) => {
                error!("Failed to spawn calibration loop: {}", e);
                CalibrationOutcome::CameraUnavailable
            }
        }
    }

    /// Ask the running calibration to cancel
    pub fn cancel_calibration(&self) -> CancelOutcome {
        let control = lock(&self.shared.control);
        match (&control.state, &control.calibration_cancel) {
            (SessionState::Calibrating, Some(cancel)) => {
                cancel.store(true, Ordering::Release);
                info!("Calibration cancel requested");
                CancelOutcome::Cancelled
            }
            _ => CancelOutcome::NotCalibrating,
        }
    }

    /// Current status; never blocks on the camera or the control lock
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.shared.status.snapshot()
    }

    /// Estimate the attention region over the recent gaze points.
    ///
    /// `strategy` falls back to the configured default.
    pub fn region(&self, strategy: Option<&str>) -> Result<Option<ScreenRoi>> {
        let clustering = &self.shared.config.clustering;
        let estimator = create_estimator(strategy.unwrap_or(&clustering.default_strategy), clustering)?;
        let points = lock(&self.shared.buffer).snapshot();
        Ok(estimator.estimate_region(self.shared.config.screen.size(), &points))
    }

    /// Number of worker loops currently running
    #[must_use]
    pub fn live_loops(&self) -> usize {
        self.shared.live_loops.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously running loops seen so far
    #[must_use]
    pub fn peak_live_loops(&self) -> usize {
        self.shared.peak_live_loops.load(Ordering::Acquire)
    }

    /// Block until the camera is free and no handoff is pending.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let control = lock(&self.shared.control);
        let (control, _) = self
            .shared
            .changed
            .wait_timeout_while(control, timeout, |c| {
                c.state != SessionState::Idle || c.pending_calibration
            })
            .unwrap_or_else(PoisonError::into_inner);
        control.state == SessionState::Idle && !control.pending_calibration
    }

    /// Stop every loop, refuse new ones and wait for the camera to be free
    pub fn shutdown(&self, timeout: Duration) -> bool {
        {
            let mut control = lock(&self.shared.control);
            control.shutting_down = true;
            if let Some(stop) = &control.tracking_stop {
                stop.store(true, Ordering::Release);
            }
            if let Some(cancel) = &control.calibration_cancel {
                cancel.store(true, Ordering::Release);
            }
        }
        info!("Session shutting down");
        self.wait_until_idle(timeout)
    }
}

/// A reserved session state that has not reached a worker loop yet.
///
/// Dropping it before [`Reservation::hand_off`] returns the session to
/// `Idle` with `camera_unavailable`, including when opening the camera
/// panics.
struct Reservation<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl<'a> Reservation<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self { shared, armed: true }
    }

    /// The worker loop owns the state from here on
    fn hand_off(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            if thread::panicking() {
                error!("Camera open panicked, releasing the session");
            }
            self.shared.release_state(Some(LoopError::CameraUnavailable));
        }
    }
}

impl Shared {
    /// Return to `Idle` and wake anyone waiting for the camera
    fn release_state(&self, error: Option<LoopError>) {
        {
            let mut control = lock(&self.control);
            control.state = SessionState::Idle;
            control.tracking_stop = None;
            control.calibration_cancel = None;
            self.status.set_state(SessionState::Idle);
            if error.is_some() {
                self.status.set_error(error);
            }
        }
        self.changed.notify_all();
    }

    fn is_shutting_down(&self) -> bool {
        lock(&self.control).shutting_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{CalibrationEvent, Camera, Frame, GazeEvent},
        geometry::{Point, ScreenSize},
        Error,
    };

    struct FixedEngine;

    impl GazeEngine for FixedEngine {
        fn step(
            &mut self,
            _frame: &Frame,
            calibrate: bool,
            _screen: ScreenSize,
            target: Option<Point>,
        ) -> Result<(GazeEvent, Option<CalibrationEvent>)> {
            let gaze = GazeEvent {
                point: Some(Point::new(100.0, 100.0)),
                fixation: 1.0,
            };
            let calibration = calibrate.then_some(CalibrationEvent {
                point: target,
                acceptance_radius: 20.0,
            });
            Ok((gaze, calibration))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct BlankCamera;

    impl Camera for BlankCamera {
        fn read(&mut self) -> Result<Frame> {
            Ok(Frame::blank(4, 4))
        }

        fn release(&mut self) {}
    }

    struct BlankSource;

    impl CameraSource for BlankSource {
        fn open(&self) -> Result<Box<dyn Camera>> {
            Ok(Box::new(BlankCamera))
        }

        fn describe(&self) -> String {
            "blank".to_string()
        }
    }

    struct MissingSource;

    impl CameraSource for MissingSource {
        fn open(&self) -> Result<Box<dyn Camera>> {
            Err(Error::CameraUnavailable("no device".to_string()))
        }

        fn describe(&self) -> String {
            "missing".to_string()
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.session.loop_interval_ms = 1;
        config.session.read_backoff_ms = 1;
        config
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(SessionState::Idle.as_status(), "ready");
        assert_eq!(StartOutcome::AlreadyRunning.as_str(), "already_running");
        assert_eq!(StopOutcome::Stopped.as_str(), "stopped");
        assert_eq!(CalibrationOutcome::Started.as_str(), "calibration_started");
        assert_eq!(CalibrationOutcome::ResourceBusy.as_str(), "resource_busy");
    }

    #[test]
    fn test_start_stop_cycle() {
        let controller = SessionController::new(test_config(), Box::new(FixedEngine), Arc::new(BlankSource)).unwrap();
        assert_eq!(controller.start_tracking(), StartOutcome::Started);
        assert_eq!(controller.start_tracking(), StartOutcome::AlreadyRunning);
        assert_eq!(controller.status().state, SessionState::Tracking);

        assert_eq!(controller.stop_tracking(), StopOutcome::Stopped);
        assert!(controller.wait_until_idle(Duration::from_secs(2)));
        assert_eq!(controller.live_loops(), 0);
        assert_eq!(controller.start_tracking(), StartOutcome::Started);
        assert!(controller.shutdown(Duration::from_secs(2)));
    }

    #[test]
    fn test_missing_camera_leaves_idle() {
        let controller = SessionController::new(test_config(), Box::new(FixedEngine), Arc::new(MissingSource)).unwrap();
        assert_eq!(controller.start_tracking(), StartOutcome::CameraUnavailable);
        let status = controller.status();
        assert_eq!(status.state, SessionState::Idle);
        assert_eq!(status.last_error, Some(LoopError::CameraUnavailable));
        assert_eq!(controller.start_calibration(), CalibrationOutcome::CameraUnavailable);
        assert_eq!(controller.status().state, SessionState::Idle);
    }

    #[test]
    fn test_stop_when_idle_is_harmless() {
        let controller = SessionController::new(test_config(), Box::new(FixedEngine), Arc::new(BlankSource)).unwrap();
        assert_eq!(controller.stop_tracking(), StopOutcome::Stopped);
        assert_eq!(controller.cancel_calibration(), CancelOutcome::NotCalibrating);
        assert_eq!(controller.status().state, SessionState::Idle);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = test_config();
        config.smoothing.alpha = 2.0;
        assert!(SessionController::new(config, Box::new(FixedEngine), Arc::new(BlankSource)).is_err());
    }

    #[test]
    fn test_shutdown_refuses_new_loops() {
        let controller = SessionController::new(test_config(), Box::new(FixedEngine), Arc::new(BlankSource)).unwrap();
        assert!(controller.shutdown(Duration::from_secs(1)));
        assert_eq!(controller.start_tracking(), StartOutcome::ShuttingDown);
    }
}
