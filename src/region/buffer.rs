use std::collections::VecDeque;

use crate::geometry::Point;

/// Bounded buffer of the most recent raw gaze points
#[derive(Debug, Clone)]
pub struct GazeBuffer {
    capacity: usize,
    points: VecDeque<Point>,
}

impl GazeBuffer {
    /// Create a buffer keeping at most `capacity` points
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a point, evicting the oldest when full
    pub fn push(&mut self, point: Point) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Copy of the buffered points, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<Point> {
        self.points.iter().copied().collect()
    }

    /// Number of buffered points
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop all buffered points
    pub fn clear(&mut self) {
        self.points.clear();
    }
}
