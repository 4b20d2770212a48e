use super::GazeFilter;
use crate::{
    constants::{DEFAULT_SMOOTHING_ALPHA, SMOOTHING_ALPHA_MAX, SMOOTHING_ALPHA_MIN},
    geometry::Point,
    Error, Result,
};

/// Exponential moving-average smoother for gaze points.
///
/// The first point after construction or [`GazeFilter::reset`] passes through
/// unchanged; every later point is blended as
/// `alpha * raw + (1 - alpha) * previous`.
#[derive(Debug, Clone)]
pub struct GazeSmoother {
    alpha: f64,
    last: Option<Point>,
}

impl GazeSmoother {
    /// Create a smoother, panicking when alpha is outside (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(
            alpha > SMOOTHING_ALPHA_MIN && alpha <= SMOOTHING_ALPHA_MAX,
            "Alpha must be in (0, 1]"
        );
        Self { alpha, last: None }
    }

    /// Create a smoother, reporting an invalid alpha as an error
    pub fn try_new(alpha: f64) -> Result<Self> {
        if alpha > SMOOTHING_ALPHA_MIN && alpha <= SMOOTHING_ALPHA_MAX {
            Ok(Self { alpha, last: None })
        } else {
            Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")))
        }
    }

    /// Feed one raw point and return the smoothed point
    pub fn update(&mut self, raw: Point) -> Point {
        let smoothed = match self.last {
            Some(last) => Point::new(
                self.alpha * raw.x + (1.0 - self.alpha) * last.x,
                self.alpha * raw.y + (1.0 - self.alpha) * last.y,
            ),
            None => raw,
        };
        self.last = Some(smoothed);
        smoothed
    }

    /// Last smoothed point, if any sample has been seen
    #[must_use]
    pub const fn current(&self) -> Option<Point> {
        self.last
    }

    /// Smoothing factor
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for GazeSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_ALPHA)
    }
}

impl GazeFilter for GazeSmoother {
    fn apply(&mut self, raw: Point) -> Point {
        self.update(raw)
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "GazeSmoother"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_passes_through() {
        let mut smoother = GazeSmoother::new(0.5);
        let out = smoother.update(Point::new(10.0, 20.0));
        assert_eq!(out, Point::new(10.0, 20.0));
    }

    #[test]
    fn test_exponential_blend() {
        let mut smoother = GazeSmoother::new(0.5);
        smoother.update(Point::new(10.0, 20.0));
        let out = smoother.update(Point::new(20.0, 30.0));
        assert_eq!(out, Point::new(15.0, 25.0)); // 0.5 * 20 + 0.5 * 10
    }

    #[test]
    fn test_alpha_bounds() {
        // High alpha = less smoothing
        let mut fast = GazeSmoother::new(0.9);
        fast.update(Point::new(10.0, 0.0));
        let p = fast.update(Point::new(20.0, 0.0));
        assert!((p.x - 19.0).abs() < 0.001);

        // Low alpha = more smoothing
        let mut slow = GazeSmoother::new(0.1);
        slow.update(Point::new(10.0, 0.0));
        let p = slow.update(Point::new(20.0, 0.0));
        assert!((p.x - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_alpha_one_tracks_input() {
        let mut smoother = GazeSmoother::new(1.0);
        smoother.update(Point::new(1.0, 1.0));
        assert_eq!(smoother.update(Point::new(50.0, 60.0)), Point::new(50.0, 60.0));
    }

    #[test]
    fn test_reset_forgets_state() {
        let mut smoother = GazeSmoother::default();
        smoother.update(Point::new(100.0, 100.0));
        smoother.reset();
        assert!(smoother.current().is_none());
        assert_eq!(smoother.update(Point::new(5.0, 5.0)), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_try_new_rejects_bad_alpha() {
        assert!(GazeSmoother::try_new(0.0).is_err());
        assert!(GazeSmoother::try_new(1.01).is_err());
        assert!(GazeSmoother::try_new(f64::NAN).is_err());
        assert!(GazeSmoother::try_new(0.7).is_ok());
    }
}
