//! Region-of-interest estimation over recent gaze points.
//!
//! Two interchangeable strategies summarise where attention concentrates:
//! density clustering keeps the largest dense group of points, the heatmap
//! strategy sizes a box from the mean and spread of the whole set. Both
//! degrade softly: bad input yields "no region" or the default region, never
//! an error.

/// Rolling buffer of recent raw gaze points
pub mod buffer;

/// Density-based clustering estimator
pub mod density;

/// Mean/standard-deviation heatmap estimator
pub mod heatmap;

use crate::{
    geometry::{Point, ScreenRoi, ScreenSize},
    Error, Result,
};
pub use buffer::GazeBuffer;
pub use density::DensityClusterEstimator;
pub use heatmap::HeatmapEstimator;

/// Common interface of the region strategies
pub trait RegionEstimator: Send + Sync {
    /// Estimate a region for the given points on a screen of the given size
    fn estimate_region(&self, screen: ScreenSize, points: &[Point]) -> Option<ScreenRoi>;

    /// Strategy name
    fn name(&self) -> &str;
}

impl RegionEstimator for DensityClusterEstimator {
    fn estimate_region(&self, _screen: ScreenSize, points: &[Point]) -> Option<ScreenRoi> {
        self.estimate(points)
    }

    fn name(&self) -> &str {
        "density"
    }
}

impl RegionEstimator for HeatmapEstimator {
    fn estimate_region(&self, screen: ScreenSize, points: &[Point]) -> Option<ScreenRoi> {
        Some(self.estimate(screen.width, screen.height, points))
    }

    fn name(&self) -> &str {
        "heatmap"
    }
}

/// Create a region estimator by strategy name (`density` or `heatmap`)
pub fn create_estimator(
    strategy: &str,
    clustering: &crate::config::ClusteringConfig,
) -> Result<Box<dyn RegionEstimator>> {
    match strategy.to_lowercase().as_str() {
        "density" | "cluster" | "dbscan" => Ok(Box::new(DensityClusterEstimator::new(
            clustering.eps,
            clustering.min_samples,
        ))),
        "heatmap" => Ok(Box::new(HeatmapEstimator::new())),
        _ => Err(Error::InvalidInput(format!("Unknown region strategy: {strategy}"))),
    }
}
