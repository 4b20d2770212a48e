//! Screen-space geometry shared by the smoothing, region and calibration code.
//!
//! Engine adapters hand points over in whatever shape their backend produces;
//! the `From` conversions here are the single place where those shapes are
//! normalised into [`Point`].

use serde::{Deserialize, Serialize};

/// A screen-space coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position in pixels
    pub x: f64,
    /// Vertical position in pixels
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// True when both coordinates are finite numbers
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Round to whole pixels, as drawn on screen
    #[must_use]
    pub fn to_pixel(&self) -> (i64, i64) {
        (self.x.trunc() as i64, self.y.trunc() as i64)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(f64::from(x), f64::from(y))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(f64::from(x), f64::from(y))
    }
}

/// Screen dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl ScreenSize {
    /// Create a new screen size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Map a normalized `[0, 1]` coordinate pair to pixels
    #[must_use]
    pub fn denormalize(&self, normalized_x: f64, normalized_y: f64) -> Point {
        Point::new(normalized_x * self.width, normalized_y * self.height)
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_SCREEN_WIDTH,
            crate::constants::DEFAULT_SCREEN_HEIGHT,
        )
    }
}

/// Rectangular region of interest on screen.
///
/// The region is only clamped at the top-left; callers must not assume it
/// lies fully inside the screen, and width/height may be zero when every
/// contributing point coincides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRoi {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl ScreenRoi {
    /// Create a new region
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Centered region covering the middle half of the screen
    #[must_use]
    pub fn centered_default(screen: ScreenSize) -> Self {
        Self::new(
            screen.width / 4.0,
            screen.height / 4.0,
            screen.width / 2.0,
            screen.height / 2.0,
        )
    }

    /// Axis-aligned bounding box of a point set, `None` when empty
    #[must_use]
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// `(x, y, width, height)` tuple
    #[must_use]
    pub const fn boundaries(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.width, self.height)
    }

    /// Center of the region
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the point lies inside or on the edge of the region
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_conversions() {
        assert_eq!(Point::from((1.5_f64, 2.5_f64)), Point::new(1.5, 2.5));
        assert_eq!(Point::from([3.0, 4.0]), Point::new(3.0, 4.0));
        assert_eq!(Point::from((7_i32, -2_i32)), Point::new(7.0, -2.0));
        assert_eq!(Point::from((0.5_f32, 0.25_f32)), Point::new(0.5, 0.25));
    }

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box() {
        let points = vec![Point::new(10.0, 10.0), Point::new(13.0, 9.0), Point::new(11.0, 12.0)];
        let roi = ScreenRoi::bounding(&points).unwrap();
        assert_eq!(roi.boundaries(), (10.0, 9.0, 3.0, 3.0));
        assert!(ScreenRoi::bounding(&[]).is_none());
    }

    #[test]
    fn test_center_and_contains() {
        let roi = ScreenRoi::new(100.0, 50.0, 200.0, 100.0);
        assert_eq!(roi.center(), Point::new(200.0, 100.0));
        assert!(roi.contains(&Point::new(100.0, 50.0)));
        assert!(!roi.contains(&Point::new(301.0, 100.0)));
    }

    #[test]
    fn test_centered_default() {
        let roi = ScreenRoi::centered_default(ScreenSize::new(1920.0, 1080.0));
        assert_eq!(roi.boundaries(), (480.0, 270.0, 960.0, 540.0));
    }
}
