//! Constants used throughout the application

use std::time::Duration;

/// Fallback screen resolution when none is configured or discovered
pub const DEFAULT_SCREEN_WIDTH: f64 = 1920.0;
pub const DEFAULT_SCREEN_HEIGHT: f64 = 1080.0;

/// Default smoothing factor; higher values weight new samples more
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.7;

/// Exponential filter bounds, alpha must lie in (MIN, MAX]
pub const SMOOTHING_ALPHA_MIN: f64 = 0.0;
pub const SMOOTHING_ALPHA_MAX: f64 = 1.0;

/// Density clustering defaults
pub const DEFAULT_CLUSTER_EPS: f64 = 100.0;
pub const DEFAULT_CLUSTER_MIN_SAMPLES: usize = 5;

/// Heatmap region never shrinks below this fraction of the screen
pub const HEATMAP_MIN_SCREEN_FRACTION: f64 = 0.1;

/// Heatmap region spans this many standard deviations
pub const HEATMAP_STD_SPAN: f64 = 2.0;

/// Rolling gaze buffer capacity
pub const DEFAULT_GAZE_BUFFER_CAPACITY: usize = 120;

/// Calibration grid defaults
pub const CALIBRATION_GRID_MIN: f64 = 0.1;
pub const CALIBRATION_GRID_MAX: f64 = 0.9;
pub const DEFAULT_CALIBRATION_GRID_RESOLUTION: usize = 6;
pub const DEFAULT_CALIBRATION_MAX_POINTS: usize = 25;

/// Acceptance radius used when the engine does not report one
pub const DEFAULT_ACCEPTANCE_RADIUS: f64 = 20.0;

/// Calibration wall-clock deadline
pub const DEFAULT_CALIBRATION_TIMEOUT: Duration = Duration::from_secs(60);

/// How long calibration waits for tracking to hand over the camera
pub const DEFAULT_PREEMPTION_GRACE: Duration = Duration::from_secs(2);

/// Worker loop pacing
pub const DEFAULT_LOOP_INTERVAL: Duration = Duration::from_millis(10);

/// Sleep after a failed frame read
pub const DEFAULT_READ_BACKOFF: Duration = Duration::from_millis(100);

/// Consecutive failed reads before a loop gives up on the camera
pub const DEFAULT_MAX_READ_FAILURES: u32 = 50;

/// Smoothed gaze must move this far (px) before it is logged again
pub const GAZE_LOG_THRESHOLD: f64 = 10.0;

/// Control API port
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Synthetic camera frame rate
pub const DEFAULT_FPS: f64 = 30.0;

/// Highest camera frame rate accepted in configuration
pub const MAX_CAMERA_FPS: f64 = 1000.0;
