use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        CALIBRATION_GRID_MAX, CALIBRATION_GRID_MIN, DEFAULT_CALIBRATION_GRID_RESOLUTION,
        DEFAULT_CALIBRATION_MAX_POINTS,
    },
    geometry::{Point, ScreenSize},
};

/// One fixation target, fixed once the session has generated it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationTarget {
    /// Position in the session's target order
    pub index: usize,
    /// Horizontal position as a fraction of screen width
    pub normalized_x: f64,
    /// Vertical position as a fraction of screen height
    pub normalized_y: f64,
    /// Target position in pixels
    pub pixel: Point,
    /// Radius around the target that counts as reaching it
    pub acceptance_radius: f64,
}

/// How calibration targets are laid out on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationLayout {
    /// `resolution × resolution` grid spanning `[0.1, 0.9]` on both axes
    Grid {
        /// Points per axis
        resolution: usize,
        /// Randomise the visiting order
        shuffle: bool,
        /// Keep at most this many targets
        max_points: usize,
    },
    /// Fixed 3×3 layout visited row by row
    NinePoint,
}

impl Default for CalibrationLayout {
    fn default() -> Self {
        Self::Grid {
            resolution: DEFAULT_CALIBRATION_GRID_RESOLUTION,
            shuffle: true,
            max_points: DEFAULT_CALIBRATION_MAX_POINTS,
        }
    }
}

const NINE_POINT_LAYOUT: [(f64, f64); 9] = [
    (0.1, 0.1),
    (0.5, 0.1),
    (0.9, 0.1),
    (0.1, 0.5),
    (0.5, 0.5),
    (0.9, 0.5),
    (0.1, 0.9),
    (0.5, 0.9),
    (0.9, 0.9),
];

/// `count` evenly spaced values from `start` to `end` inclusive
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Generate the ordered targets of a new session
pub fn generate_targets<R: Rng + ?Sized>(
    layout: &CalibrationLayout,
    screen: ScreenSize,
    acceptance_radius: f64,
    rng: &mut R,
) -> Vec<CalibrationTarget> {
    let normalized: Vec<(f64, f64)> = match layout {
        CalibrationLayout::Grid {
            resolution,
            shuffle,
            max_points,
        } => {
            let axis = linspace(CALIBRATION_GRID_MIN, CALIBRATION_GRID_MAX, *resolution);
            let mut grid: Vec<(f64, f64)> = axis
                .iter()
                .flat_map(|&y| axis.iter().map(move |&x| (x, y)))
                .collect();
            if *shuffle {
                grid.shuffle(rng);
            }
            grid.truncate(*max_points);
            grid
        }
        CalibrationLayout::NinePoint => NINE_POINT_LAYOUT.to_vec(),
    };

    normalized
        .into_iter()
        .enumerate()
        .map(|(index, (nx, ny))| CalibrationTarget {
            index,
            normalized_x: nx,
            normalized_y: ny,
            pixel: screen.denormalize(nx, ny),
            acceptance_radius,
        })
        .collect()
}
