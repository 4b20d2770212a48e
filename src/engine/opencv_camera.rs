//! Webcam capture through OpenCV.

use std::time::Instant;

use log::{info, warn};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};

use super::{Camera, CameraSource, Frame};
use crate::{Error, Result};

/// Opened OpenCV capture device
pub struct OpenCvCamera {
    capture: VideoCapture,
    mirror: bool,
}

impl Camera for OpenCvCamera {
    fn read(&mut self) -> Result<Frame> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(|e| Error::FrameRead(e.to_string()))?;
        if !ok || frame.empty() {
            return Err(Error::FrameRead("Camera returned no frame".to_string()));
        }

        // Mirror so that looking left moves the gaze left on screen
        if self.mirror {
            let temp = frame.clone();
            opencv::core::flip(&temp, &mut frame, 1).map_err(|e| Error::FrameRead(e.to_string()))?;
        }

        let data = frame
            .data_bytes()
            .map_err(|e| Error::FrameRead(e.to_string()))?
            .to_vec();
        Ok(Frame {
            width: u32::try_from(frame.cols()).unwrap_or(0),
            height: u32::try_from(frame.rows()).unwrap_or(0),
            data,
            captured_at: Instant::now(),
        })
    }

    fn release(&mut self) {
        release_capture(&mut self.capture);
    }
}

fn release_capture(capture: &mut VideoCapture) {
    if let Err(e) = capture.release() {
        warn!("Failed to release camera: {}", e);
    }
}

/// Source opening a webcam by index
#[derive(Debug, Clone)]
pub struct OpenCvCameraSource {
    index: i32,
    mirror: bool,
}

impl OpenCvCameraSource {
    /// Create a source for camera `index`
    #[must_use]
    pub const fn new(index: i32, mirror: bool) -> Self {
        Self { index, mirror }
    }
}

impl CameraSource for OpenCvCameraSource {
    fn open(&self) -> Result<Box<dyn Camera>> {
        info!("Opening camera {}", self.index);
        let mut capture = VideoCapture::new(self.index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::CameraUnavailable(format!("Camera {} could not be opened", self.index)));
        }

        // Reduce buffer size for lower latency
        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;

        // The first read proves the device actually delivers frames
        let mut first_frame = Mat::default();
        if !capture.read(&mut first_frame)? || first_frame.empty() {
            release_capture(&mut capture);
            return Err(Error::CameraUnavailable(format!("Camera {} delivered no frame", self.index)));
        }

        Ok(Box::new(OpenCvCamera {
            capture,
            mirror: self.mirror,
        }))
    }

    fn describe(&self) -> String {
        format!("camera {}", self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_device_is_unavailable() {
        let source = OpenCvCameraSource::new(9999, false);
        assert!(source.open().is_err());
        assert_eq!(source.describe(), "camera 9999");
    }
}
