use std::time::{Duration, Instant};

use super::{Camera, CameraSource, Frame};
use crate::{constants::DEFAULT_FPS, Error, Result};

/// Camera producing blank frames at a fixed rate
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    frame_interval: Duration,
    next_frame: Instant,
}

impl Camera for SyntheticCamera {
    fn read(&mut self) -> Result<Frame> {
        let now = Instant::now();
        if self.next_frame > now {
            std::thread::sleep(self.next_frame - now);
        }
        self.next_frame = Instant::now() + self.frame_interval;
        Ok(Frame::blank(self.width, self.height))
    }

    fn release(&mut self) {}
}

/// Source of [`SyntheticCamera`] handles
#[derive(Debug, Clone)]
pub struct SyntheticCameraSource {
    width: u32,
    height: u32,
    fps: f64,
}

impl SyntheticCameraSource {
    /// Create a source producing `width × height` frames at `fps`
    #[must_use]
    pub const fn new(width: u32, height: u32, fps: f64) -> Self {
        Self { width, height, fps }
    }
}

impl Default for SyntheticCameraSource {
    fn default() -> Self {
        Self::new(640, 480, DEFAULT_FPS)
    }
}

impl CameraSource for SyntheticCameraSource {
    fn open(&self) -> Result<Box<dyn Camera>> {
        let frame_interval = if self.fps > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.fps)
                .map_err(|_| Error::CameraUnavailable(format!("Unsupported frame rate: {} fps", self.fps)))?
        } else {
            Duration::ZERO
        };
        Ok(Box::new(SyntheticCamera {
            width: self.width,
            height: self.height,
            frame_interval,
            next_frame: Instant::now(),
        }))
    }

    fn describe(&self) -> String {
        format!("synthetic {}x{}@{}fps", self.width, self.height, self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_have_requested_size() {
        let source = SyntheticCameraSource::new(4, 3, 1000.0);
        let mut camera = source.open().unwrap();
        let frame = camera.read().unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.data.len(), 36);
    }

    #[test]
    fn test_frames_are_paced() {
        let source = SyntheticCameraSource::new(1, 1, 100.0);
        let mut camera = source.open().unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            camera.read().unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_unrepresentable_frame_rate_is_unavailable() {
        let source = SyntheticCameraSource::new(2, 2, 1e-30);
        assert!(matches!(source.open(), Err(Error::CameraUnavailable(_))));
    }
}
