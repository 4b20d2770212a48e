use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::{CalibrationEvent, Frame, GazeEngine, GazeEvent};
use crate::{
    constants::DEFAULT_ACCEPTANCE_RADIUS,
    geometry::{Point, ScreenSize},
    Error, Result,
};

/// One recorded engine output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplaySample {
    /// Horizontal gaze position
    pub x: f64,
    /// Vertical gaze position
    pub y: f64,
    /// Fixation score
    #[serde(default)]
    pub fixation: f64,
}

#[derive(Debug, Deserialize)]
struct ReplayLog {
    samples: Vec<ReplaySample>,
}

/// Engine that replays a recorded gaze log, looping at the end.
///
/// In calibration mode it behaves like a user who always fixates the target
/// shown, reporting the target position as reached.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    samples: Vec<ReplaySample>,
    position: usize,
    acceptance_radius: f64,
}

impl ReplayEngine {
    /// Create an engine over in-memory samples
    pub fn new(samples: Vec<ReplaySample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EngineInitialization("Replay log has no samples".to_string()));
        }
        Ok(Self {
            samples,
            position: 0,
            acceptance_radius: DEFAULT_ACCEPTANCE_RADIUS,
        })
    }

    /// Load a YAML log of the form `samples: [{x, y, fixation}, ...]`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::EngineInitialization(format!("Cannot read {}: {e}", path.display())))?;
        let log: ReplayLog = serde_yaml::from_str(&content)
            .map_err(|e| Error::EngineInitialization(format!("Cannot parse {}: {e}", path.display())))?;
        info!("Loaded {} replay samples from {}", log.samples.len(), path.display());
        Self::new(log.samples)
    }

    /// Number of recorded samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; construction rejects empty logs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn next_sample(&mut self) -> ReplaySample {
        let sample = self.samples[self.position];
        self.position = (self.position + 1) % self.samples.len();
        sample
    }
}

impl GazeEngine for ReplayEngine {
    fn step(
        &mut self,
        _frame: &Frame,
        calibrate: bool,
        _screen: ScreenSize,
        target: Option<Point>,
    ) -> Result<(GazeEvent, Option<CalibrationEvent>)> {
        let sample = self.next_sample();
        let gaze = GazeEvent {
            point: Some(Point::from((sample.x, sample.y))),
            fixation: sample.fixation,
        };
        let calibration = calibrate.then_some(CalibrationEvent {
            point: target,
            acceptance_radius: self.acceptance_radius,
        });
        Ok((gaze, calibration))
    }

    fn name(&self) -> &str {
        "replay"
    }
}
