//! Statistical region estimate from the mean and spread of gaze points.

use log::debug;

use crate::{
    constants::{HEATMAP_MIN_SCREEN_FRACTION, HEATMAP_STD_SPAN},
    geometry::{Point, ScreenRoi, ScreenSize},
};

/// Heatmap region estimator; always produces a usable region
#[derive(Debug, Clone, Default)]
pub struct HeatmapEstimator;

impl HeatmapEstimator {
    /// Create a new estimator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Region centred on the mean of `points`, sized to two standard
    /// deviations but never below a tenth of the screen.
    ///
    /// Fewer than two points, or any non-finite statistic, yields the
    /// centred default region covering the middle half of the screen.
    #[must_use]
    pub fn estimate(&self, screen_width: f64, screen_height: f64, points: &[Point]) -> ScreenRoi {
        let screen = ScreenSize::new(screen_width, screen_height);
        if points.len() < 2 {
            return ScreenRoi::centered_default(screen);
        }

        let (Some(stats_x), Some(stats_y)) = (
            Statistics::of(points.iter().map(|p| p.x)),
            Statistics::of(points.iter().map(|p| p.y)),
        ) else {
            debug!("Heatmap statistics not finite, using default region");
            return ScreenRoi::centered_default(screen);
        };

        let roi_width = (HEATMAP_MIN_SCREEN_FRACTION * screen_width).max(HEATMAP_STD_SPAN * stats_x.std_dev);
        let roi_height = (HEATMAP_MIN_SCREEN_FRACTION * screen_height).max(HEATMAP_STD_SPAN * stats_y.std_dev);

        let x = (stats_x.mean - roi_width / 2.0).max(0.0);
        let y = (stats_y.mean - roi_height / 2.0).max(0.0);

        ScreenRoi::new(x, y, roi_width, roi_height)
    }
}

/// Mean and population standard deviation of one coordinate
#[derive(Debug, Clone, Copy)]
struct Statistics {
    mean: f64,
    std_dev: f64,
}

impl Statistics {
    fn of(values: impl Iterator<Item = f64> + Clone) -> Option<Self> {
        let n = values.clone().count() as f64;
        let mean = values.clone().sum::<f64>() / n;
        let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        (mean.is_finite() && std_dev.is_finite()).then_some(Self { mean, std_dev })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region_for_sparse_input() {
        let estimator = HeatmapEstimator::new();
        let roi = estimator.estimate(1920.0, 1080.0, &[Point::new(5.0, 5.0)]);
        assert_eq!(roi.boundaries(), (480.0, 270.0, 960.0, 540.0));
        let roi = estimator.estimate(1000.0, 600.0, &[]);
        assert_eq!(roi.boundaries(), (250.0, 150.0, 500.0, 300.0));
    }

    #[test]
    fn test_minimum_size_for_tight_cluster() {
        let estimator = HeatmapEstimator::new();
        let points = vec![Point::new(500.0, 500.0), Point::new(501.0, 501.0)];
        let roi = estimator.estimate(1920.0, 1080.0, &points);
        assert!((roi.width - 192.0).abs() < 1e-9);
        assert!((roi.height - 108.0).abs() < 1e-9);
        let center = roi.center();
        assert!((center.x - 500.5).abs() < 1e-9);
        assert!((center.y - 500.5).abs() < 1e-9);
    }

    #[test]
    fn test_spread_grows_region() {
        let estimator = HeatmapEstimator::new();
        // x values 0 and 1000: mean 500, population std 500
        let points = vec![Point::new(0.0, 500.0), Point::new(1000.0, 500.0)];
        let roi = estimator.estimate(1920.0, 1080.0, &points);
        assert!((roi.width - 1000.0).abs() < 1e-9);
        assert_eq!(roi.x, 0.0);
    }

    #[test]
    fn test_top_left_clamped() {
        let estimator = HeatmapEstimator::new();
        let points = vec![Point::new(0.0, 0.0), Point::new(2.0, 2.0)];
        let roi = estimator.estimate(1920.0, 1080.0, &points);
        assert_eq!(roi.x, 0.0);
        assert_eq!(roi.y, 0.0);
    }

    #[test]
    fn test_bottom_right_not_clamped() {
        let estimator = HeatmapEstimator::new();
        let points = vec![Point::new(1919.0, 1079.0), Point::new(1920.0, 1080.0)];
        let roi = estimator.estimate(1920.0, 1080.0, &points);
        assert!(roi.x + roi.width > 1920.0);
    }

    #[test]
    fn test_non_finite_falls_back() {
        let estimator = HeatmapEstimator::new();
        let points = vec![Point::new(f64::INFINITY, 0.0), Point::new(1.0, 1.0)];
        let roi = estimator.estimate(800.0, 600.0, &points);
        assert_eq!(roi.boundaries(), (200.0, 150.0, 400.0, 300.0));
    }
}
