//! Gaze signal processing and session orchestration.
//!
//! This library sits between an external gaze-estimation engine and the
//! clients that want to know where a user is looking:
//! - Exponential smoothing of the raw per-frame gaze estimate
//! - Region-of-interest estimation over recent points, by density clustering
//!   or by a mean/spread heatmap
//! - A calibration state machine walking the user through on-screen targets
//! - A session controller that arbitrates one camera between tracking and
//!   calibration
//! - An HTTP/JSON control API
//!
//! # Examples
//!
//! ## Smoothing
//!
//! ```
//! use gaze_session::{filters::GazeSmoother, geometry::Point};
//!
//! let mut smoother = GazeSmoother::new(0.7);
//! smoother.update(Point::new(100.0, 100.0));
//! let smoothed = smoother.update(Point::new(200.0, 100.0));
//! assert!((smoothed.x - 170.0).abs() < 1e-9);
//! ```
//!
//! ## Region Estimation
//!
//! ```
//! use gaze_session::{geometry::Point, region::DensityClusterEstimator};
//!
//! let raw: [(f64, f64); 4] = [(10.0, 10.0), (12.0, 11.0), (11.0, 9.0), (13.0, 12.0)];
//! let points: Vec<Point> = raw
//!     .into_iter()
//!     .map(Point::from)
//!     .collect();
//! let roi = DensityClusterEstimator::new(100.0, 3).estimate(&points).unwrap();
//! assert_eq!((roi.x, roi.y, roi.width, roi.height), (10.0, 9.0, 3.0, 3.0));
//! ```
//!
//! ## Running a Session
//!
//! ```no_run
//! use std::sync::Arc;
//! use gaze_session::{
//!     config::Config,
//!     engine::{ReplayEngine, SyntheticCameraSource},
//!     session::{SessionController, StartOutcome},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = ReplayEngine::from_file("gaze_log.yaml")?;
//! let controller = SessionController::new(
//!     Config::default(),
//!     Box::new(engine),
//!     Arc::new(SyntheticCameraSource::default()),
//! )?;
//! assert_eq!(controller.start_tracking(), StartOutcome::Started);
//! println!("{:?}", controller.status());
//! # Ok(())
//! # }
//! ```

/// HTTP/JSON control API
pub mod api;

/// Calibration targets and the calibration state machine
pub mod calibration;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Gaze engine and camera boundary
pub mod engine;

/// Error types and result aliases
pub mod error;

/// Gaze smoothing filters
pub mod filters;

/// Points, screen sizes and regions
pub mod geometry;

/// Region-of-interest estimation
pub mod region;

/// Session controller and worker loops
pub mod session;

/// Screen zone classification
pub mod zones;

pub use error::{Error, Result};
