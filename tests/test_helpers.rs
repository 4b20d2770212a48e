//! Helper engines, cameras and configuration for tests
#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use gaze_session::{
    calibration::CalibrationLayout,
    config::Config,
    engine::{CalibrationEvent, Camera, CameraSource, Frame, GazeEngine, GazeEvent},
    geometry::{Point, ScreenSize},
    Error, Result,
};

/// Engine replaying a fixed gaze script; during calibration it either looks
/// straight at the current target or reports nothing
pub struct ScriptedEngine {
    gaze: Vec<Option<Point>>,
    position: usize,
    follows_targets: bool,
    pub steps: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new(gaze: Vec<Option<Point>>, follows_targets: bool) -> Self {
        Self {
            gaze,
            position: 0,
            follows_targets,
            steps: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Gaze jittering around (100, 100), calibration targets always reached
    pub fn steady() -> Self {
        Self::new(
            vec![
                Some(Point::new(100.0, 100.0)),
                Some(Point::new(103.0, 98.0)),
                Some(Point::new(97.0, 102.0)),
                Some(Point::new(101.0, 104.0)),
                Some(Point::new(99.0, 96.0)),
            ],
            true,
        )
    }

    /// Same gaze as [`ScriptedEngine::steady`] but never reaches a target
    pub fn distracted() -> Self {
        let mut engine = Self::steady();
        engine.follows_targets = false;
        engine
    }
}

impl GazeEngine for ScriptedEngine {
    fn step(
        &mut self,
        _frame: &Frame,
        calibrate: bool,
        _screen: ScreenSize,
        target: Option<Point>,
    ) -> Result<(GazeEvent, Option<CalibrationEvent>)> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        let point = if self.gaze.is_empty() {
            None
        } else {
            let point = self.gaze[self.position % self.gaze.len()];
            self.position += 1;
            point
        };
        let calibration = calibrate.then(|| CalibrationEvent {
            point: if self.follows_targets { target } else { None },
            acceptance_radius: 20.0,
        });
        Ok((GazeEvent { point, fixation: 1.0 }, calibration))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Counters shared by a [`CountingCameraSource`] and its cameras
#[derive(Debug, Default)]
pub struct CameraStats {
    pub opens: AtomicUsize,
    pub releases: AtomicUsize,
    pub reads: AtomicUsize,
    pub open_now: AtomicUsize,
    pub peak_open: AtomicUsize,
}

impl CameraStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn open_now(&self) -> usize {
        self.open_now.load(Ordering::SeqCst)
    }

    pub fn peak_open(&self) -> usize {
        self.peak_open.load(Ordering::SeqCst)
    }
}

struct CountingCamera {
    stats: Arc<CameraStats>,
    read_delay: Duration,
    fail_reads: bool,
}

impl Camera for CountingCamera {
    fn read(&mut self) -> Result<Frame> {
        if !self.read_delay.is_zero() {
            thread::sleep(self.read_delay);
        }
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            Err(Error::FrameRead("scripted failure".to_string()))
        } else {
            Ok(Frame::blank(2, 2))
        }
    }

    fn release(&mut self) {
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
        self.stats.open_now.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Camera source counting every open, read and release
pub struct CountingCameraSource {
    pub stats: Arc<CameraStats>,
    read_delay: Duration,
    fail_reads: bool,
}

impl CountingCameraSource {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(CameraStats::default()),
            read_delay: Duration::ZERO,
            fail_reads: false,
        }
    }

    /// Every read blocks for `delay`
    pub fn slow(delay: Duration) -> Self {
        Self {
            read_delay: delay,
            ..Self::new()
        }
    }

    /// Opens fine, but every read fails
    pub fn broken() -> Self {
        Self {
            fail_reads: true,
            ..Self::new()
        }
    }
}

impl CameraSource for CountingCameraSource {
    fn open(&self) -> Result<Box<dyn Camera>> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_open.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(CountingCamera {
            stats: Arc::clone(&self.stats),
            read_delay: self.read_delay,
            fail_reads: self.fail_reads,
        }))
    }

    fn describe(&self) -> String {
        "counting camera".to_string()
    }
}

/// Camera source whose device never opens
pub struct FailingCameraSource;

impl CameraSource for FailingCameraSource {
    fn open(&self) -> Result<Box<dyn Camera>> {
        Err(Error::CameraUnavailable("device missing".to_string()))
    }

    fn describe(&self) -> String {
        "failing camera".to_string()
    }
}

/// Source whose driver panics while opening the device
pub struct PanickingCameraSource;

impl CameraSource for PanickingCameraSource {
    fn open(&self) -> Result<Box<dyn Camera>> {
        panic!("camera driver crashed");
    }

    fn describe(&self) -> String {
        "panicking camera".to_string()
    }
}

/// Configuration with fast loops and a nine-point calibration
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.session.loop_interval_ms = 1;
    config.session.read_backoff_ms = 1;
    config.session.max_read_failures = 3;
    config.session.preemption_grace_ms = 1000;
    config.calibration.layout = CalibrationLayout::NinePoint;
    config.calibration.timeout_secs = 10;
    config
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
