//! Boundary to the external gaze engine and camera.
//!
//! The gaze-estimation engine and frame acquisition are black boxes; this
//! module fixes the traits they are consumed through, plus a few adapters:
//! a replaying engine and a synthetic camera that need no hardware, and
//! feature-gated OpenCV and X11 backends.

/// Recorded gaze replay engine
pub mod replay;

/// Paced blank-frame camera
pub mod synthetic;

/// OpenCV webcam capture
#[cfg(feature = "opencv")]
pub mod opencv_camera;

/// X11 pointer-driven engine and screen discovery
#[cfg(feature = "x11")]
pub mod pointer;

use std::time::Instant;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    geometry::{Point, ScreenSize},
    Result,
};
pub use replay::ReplayEngine;
pub use synthetic::{SyntheticCamera, SyntheticCameraSource};

/// One captured camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Raw pixel bytes in the backend's native layout
    pub data: Vec<u8>,
    /// Capture time
    pub captured_at: Instant,
}

impl Frame {
    /// Create a zero-filled frame
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
            captured_at: Instant::now(),
        }
    }
}

/// Gaze estimate for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GazeEvent {
    /// Estimated on-screen point, absent when the engine lost the eyes
    pub point: Option<Point>,
    /// Fixation score
    pub fixation: f64,
}

impl GazeEvent {
    /// Attach a timestamp, dropping events without a point
    #[must_use]
    pub fn into_sample(self, timestamp: Instant) -> Option<GazeSample> {
        self.point.map(|point| GazeSample {
            point,
            fixation: self.fixation,
            timestamp,
        })
    }
}

/// Calibration feedback for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationEvent {
    /// Point the engine considers reached, if any
    pub point: Option<Point>,
    /// Radius around the current target that counts as reaching it
    pub acceptance_radius: f64,
}

/// A timestamped gaze estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    /// On-screen point
    pub point: Point,
    /// Fixation score
    pub fixation: f64,
    /// When the frame was processed
    pub timestamp: Instant,
}

/// External gaze-estimation engine
pub trait GazeEngine: Send {
    /// Process one frame.
    ///
    /// With `calibrate` set the engine also reports calibration feedback for
    /// `target`, the pixel position of the target currently shown.
    fn step(
        &mut self,
        frame: &Frame,
        calibrate: bool,
        screen: ScreenSize,
        target: Option<Point>,
    ) -> Result<(GazeEvent, Option<CalibrationEvent>)>;

    /// Engine name
    fn name(&self) -> &str;
}

/// An opened camera device
pub trait Camera: Send {
    /// Read the next frame
    fn read(&mut self) -> Result<Frame>;

    /// Release the device; called exactly once
    fn release(&mut self);
}

/// Factory for camera handles; each loop opens its own
pub trait CameraSource: Send + Sync {
    /// Open the device
    fn open(&self) -> Result<Box<dyn Camera>>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Exclusive camera handle released on every exit path
pub struct CameraGuard {
    camera: Option<Box<dyn Camera>>,
    description: String,
}

impl CameraGuard {
    /// Open a camera from `source`
    pub fn acquire(source: &dyn CameraSource) -> Result<Self> {
        let description = source.describe();
        let camera = source.open()?;
        debug!("Acquired camera {}", description);
        Ok(Self {
            camera: Some(camera),
            description,
        })
    }

    /// Read the next frame
    pub fn read(&mut self) -> Result<Frame> {
        match self.camera.as_mut() {
            Some(camera) => camera.read(),
            None => Err(crate::Error::CameraUnavailable(format!(
                "{} already released",
                self.description
            ))),
        }
    }

    /// Release now instead of on drop
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.release();
            debug!("Released camera {}", self.description);
        }
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        if self.camera.is_some() {
            if std::thread::panicking() {
                warn!("Releasing camera {} during unwind", self.description);
            }
            self.release_inner();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCamera {
        released: Arc<AtomicUsize>,
    }

    impl Camera for CountingCamera {
        fn read(&mut self) -> Result<Frame> {
            Ok(Frame::blank(2, 2))
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingSource {
        released: Arc<AtomicUsize>,
    }

    impl CameraSource for CountingSource {
        fn open(&self) -> Result<Box<dyn Camera>> {
            Ok(Box::new(CountingCamera {
                released: Arc::clone(&self.released),
            }))
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            released: Arc::clone(&released),
        };
        {
            let mut guard = CameraGuard::acquire(&source).unwrap();
            assert!(guard.read().is_ok());
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_happens_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            released: Arc::clone(&released),
        };
        let guard = CameraGuard::acquire(&source).unwrap();
        guard.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gaze_event_into_sample() {
        let now = Instant::now();
        let event = GazeEvent {
            point: Some(Point::new(3.0, 4.0)),
            fixation: 0.5,
        };
        let sample = event.into_sample(now).unwrap();
        assert_eq!(sample.point, Point::new(3.0, 4.0));
        assert!(GazeEvent { point: None, fixation: 0.0 }.into_sample(now).is_none());
    }
}
