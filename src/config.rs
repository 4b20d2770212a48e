//! Configuration management for the gaze session service

use crate::{
    calibration::CalibrationLayout,
    constants::{
        DEFAULT_ACCEPTANCE_RADIUS, DEFAULT_CALIBRATION_TIMEOUT, DEFAULT_CLUSTER_EPS,
        DEFAULT_CLUSTER_MIN_SAMPLES, DEFAULT_FPS, DEFAULT_GAZE_BUFFER_CAPACITY, DEFAULT_LOOP_INTERVAL,
        DEFAULT_MAX_READ_FAILURES, DEFAULT_PREEMPTION_GRACE, DEFAULT_READ_BACKOFF, DEFAULT_SCREEN_HEIGHT,
        DEFAULT_SCREEN_WIDTH, DEFAULT_SERVER_PORT, DEFAULT_SMOOTHING_ALPHA, MAX_CAMERA_FPS,
    },
    geometry::ScreenSize,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Screen geometry
    pub screen: ScreenConfig,

    /// Gaze smoothing
    pub smoothing: SmoothingConfig,

    /// Density clustering and the rolling point buffer
    pub clustering: ClusteringConfig,

    /// Calibration sessions
    pub calibration: CalibrationConfig,

    /// Session loop timing
    pub session: SessionConfig,

    /// Camera device
    pub camera: CameraConfig,

    /// Control API server
    pub server: ServerConfig,
}

/// Screen dimensions used to map engine output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Width in pixels
    pub width: f64,

    /// Height in pixels
    pub height: f64,
}

/// Smoothing filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type (`exponential` or `none`)
    pub filter: String,

    /// Exponential filter alpha value
    pub alpha: f64,
}

/// Region estimation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Neighbourhood radius in screen units
    pub eps: f64,

    /// Neighbours (self included) required for a core point
    pub min_samples: usize,

    /// Recent raw points kept for region estimation
    pub buffer_capacity: usize,

    /// Strategy used when a request names none (`density` or `heatmap`)
    pub default_strategy: String,
}

/// Calibration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Target layout
    pub layout: CalibrationLayout,

    /// Acceptance radius assigned to generated targets
    pub acceptance_radius: f64,

    /// Session deadline in seconds
    pub timeout_secs: u64,
}

/// Worker loop timing and arbitration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long calibration waits for tracking to yield the camera
    pub preemption_grace_ms: u64,

    /// Pause between loop iterations
    pub loop_interval_ms: u64,

    /// Pause after a failed frame read
    pub read_backoff_ms: u64,

    /// Consecutive failed reads before a loop gives up
    pub max_read_failures: u32,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Backend (`synthetic` or `opencv`)
    pub backend: String,

    /// Device index for the OpenCV backend
    pub index: i32,

    /// Mirror frames horizontally
    pub mirror: bool,

    /// Synthetic frame rate
    pub fps: f64,
}

/// Control API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "exponential".to_string(),
            alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_CLUSTER_EPS,
            min_samples: DEFAULT_CLUSTER_MIN_SAMPLES,
            buffer_capacity: DEFAULT_GAZE_BUFFER_CAPACITY,
            default_strategy: "density".to_string(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            layout: CalibrationLayout::default(),
            acceptance_radius: DEFAULT_ACCEPTANCE_RADIUS,
            timeout_secs: DEFAULT_CALIBRATION_TIMEOUT.as_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preemption_grace_ms: DEFAULT_PREEMPTION_GRACE.as_millis() as u64,
            loop_interval_ms: DEFAULT_LOOP_INTERVAL.as_millis() as u64,
            read_backoff_ms: DEFAULT_READ_BACKOFF.as_millis() as u64,
            max_read_failures: DEFAULT_MAX_READ_FAILURES,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: "synthetic".to_string(),
            index: 0,
            mirror: true,
            fps: DEFAULT_FPS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl ScreenConfig {
    /// Screen size value
    #[must_use]
    pub const fn size(&self) -> ScreenSize {
        ScreenSize::new(self.width, self.height)
    }
}

impl CalibrationConfig {
    /// Session deadline
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionConfig {
    /// Preemption grace period
    #[must_use]
    pub const fn preemption_grace(&self) -> Duration {
        Duration::from_millis(self.preemption_grace_ms)
    }

    /// Loop pacing
    #[must_use]
    pub const fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }

    /// Backoff after a failed read
    #[must_use]
    pub const fn read_backoff(&self) -> Duration {
        Duration::from_millis(self.read_backoff_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the configured smoothing filter
    pub fn create_filter(&self) -> Result<Box<dyn crate::filters::GazeFilter>> {
        use crate::filters::{create_filter, GazeSmoother};

        match self.smoothing.filter.as_str() {
            "exponential" => Ok(Box::new(GazeSmoother::try_new(self.smoothing.alpha)?)),
            name => create_filter(name),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Validate screen
        if !(self.screen.width > 0.0 && self.screen.height > 0.0) {
            return Err(Error::ConfigError("Screen width and height must be positive".to_string()));
        }

        // Validate smoothing
        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err(Error::ConfigError("Smoothing alpha must be in (0, 1]".to_string()));
        }

        // Validate clustering
        if !(self.clustering.eps > 0.0 && self.clustering.eps.is_finite()) {
            return Err(Error::ConfigError("Cluster eps must be positive".to_string()));
        }
        if self.clustering.min_samples == 0 {
            return Err(Error::ConfigError("Cluster min_samples must be greater than 0".to_string()));
        }
        if self.clustering.buffer_capacity == 0 {
            return Err(Error::ConfigError("Gaze buffer capacity must be greater than 0".to_string()));
        }
        if !matches!(self.clustering.default_strategy.as_str(), "density" | "heatmap") {
            return Err(Error::ConfigError(format!(
                "Unknown region strategy: {}",
                self.clustering.default_strategy
            )));
        }

        // Validate calibration
        if let CalibrationLayout::Grid {
            resolution,
            max_points,
            ..
        } = self.calibration.layout
        {
            if resolution == 0 {
                return Err(Error::ConfigError("Calibration grid resolution must be at least 1".to_string()));
            }
            if max_points == 0 {
                return Err(Error::ConfigError("Calibration max_points must be greater than 0".to_string()));
            }
        }
        if self.calibration.timeout_secs == 0 {
            return Err(Error::ConfigError("Calibration timeout must be greater than 0".to_string()));
        }

        // Validate session timing
        if self.session.preemption_grace_ms == 0 {
            return Err(Error::ConfigError("Preemption grace period must be greater than 0".to_string()));
        }
        if self.session.max_read_failures == 0 {
            return Err(Error::ConfigError("max_read_failures must be greater than 0".to_string()));
        }

        // Validate camera
        if !matches!(self.camera.backend.as_str(), "synthetic" | "opencv") {
            return Err(Error::ConfigError(format!("Unknown camera backend: {}", self.camera.backend)));
        }
        if !(self.camera.fps > 0.0 && self.camera.fps <= MAX_CAMERA_FPS) {
            return Err(Error::ConfigError(format!(
                "Camera fps must be in (0, {}]",
                MAX_CAMERA_FPS
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze Session Configuration

# Screen geometry
screen:
  width: 1920
  height: 1080

# Gaze smoothing
smoothing:
  filter: "exponential"
  alpha: 0.7

# Region estimation
clustering:
  eps: 100.0
  min_samples: 5
  buffer_capacity: 120
  default_strategy: "density"

# Calibration
calibration:
  layout:
    kind: grid
    resolution: 6
    shuffle: true
    max_points: 25
  acceptance_radius: 20.0
  timeout_secs: 60

# Loop timing
session:
  preemption_grace_ms: 2000
  loop_interval_ms: 10
  read_backoff_ms: 100
  max_read_failures: 50

# Camera
camera:
  backend: "synthetic"
  index: 0
  mirror: true
  fps: 30.0

# Control API
server:
  host: "127.0.0.1"
  port: 8000
"#;
