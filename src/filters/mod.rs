//! Signal filtering for smoothing raw gaze points.
//!
//! Gaze engines emit one noisy point per frame; the filters here turn that
//! stream into a stable on-screen signal.

/// Exponential moving-average smoother
pub mod exponential;

use crate::{geometry::Point, Error, Result};
pub use exponential::GazeSmoother;

/// Trait for all gaze filters
pub trait GazeFilter: Send + Sync {
    /// Apply filter to a raw point
    fn apply(&mut self, raw: Point) -> Point;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes points through unchanged
pub struct NoFilter;

impl GazeFilter for NoFilter {
    fn apply(&mut self, raw: Point) -> Point {
        raw
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a gaze filter by type name.
///
/// Accepts `none`, `exponential` and `exponential:<alpha>`.
pub fn create_filter(filter_type: &str) -> Result<Box<dyn GazeFilter>> {
    let spec = filter_type.to_lowercase();
    let mut parts = spec.splitn(2, ':');
    let name = parts.next().unwrap_or_default();
    let param = parts.next();

    match (name, param) {
        ("none" | "nofilter", None) => Ok(Box::new(NoFilter)),
        ("exponential" | "ema", None) => Ok(Box::new(GazeSmoother::default())),
        ("exponential" | "ema", Some(alpha)) => {
            let alpha: f64 = alpha
                .parse()
                .map_err(|_| Error::FilterError(format!("Alpha is not a number: {alpha}")))?;
            Ok(Box::new(GazeSmoother::try_new(alpha)?))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}
