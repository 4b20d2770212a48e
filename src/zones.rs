//! Screen zone classification of the smoothed gaze.
//!
//! The screen is split into four coloured quadrants; the status surface
//! reports which one the user is looking at.

use serde::Serialize;

use crate::geometry::{Point, ScreenSize};

/// Screen quadrant under the gaze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Zone {
    /// Top left
    Red,
    /// Top right
    Blue,
    /// Bottom left
    Green,
    /// Bottom right
    Yellow,
    /// No zone known
    #[default]
    None,
}

impl Zone {
    /// Display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::None => "None",
        }
    }

    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Red => 1,
            Self::Blue => 2,
            Self::Green => 3,
            Self::Yellow => 4,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Red,
            2 => Self::Blue,
            3 => Self::Green,
            4 => Self::Yellow,
            _ => Self::None,
        }
    }

    /// Quadrant containing `point`; `None` off screen
    #[must_use]
    pub fn classify(point: Point, screen: ScreenSize) -> Self {
        let on_screen = (0.0..screen.width).contains(&point.x) && (0.0..screen.height).contains(&point.y);
        if !on_screen {
            return Self::None;
        }
        let center_x = screen.width / 2.0;
        let center_y = screen.height / 2.0;
        match (point.x < center_x, point.y < center_y) {
            (true, true) => Self::Red,
            (false, true) => Self::Blue,
            (true, false) => Self::Green,
            (false, false) => Self::Yellow,
        }
    }
}

/// Tracks the current zone; the origin sentinel never changes it
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneTracker {
    current: Zone,
}

impl ZoneTracker {
    /// Feed a gaze point; returns `Some(new zone)` when the zone changed
    pub fn update(&mut self, point: Point, screen: ScreenSize) -> Option<Zone> {
        if point.to_pixel() == (0, 0) {
            return None;
        }
        let zone = Zone::classify(point, screen);
        (zone != self.current).then(|| {
            self.current = zone;
            zone
        })
    }

    /// Current zone
    #[must_use]
    pub const fn current(&self) -> Zone {
        self.current
    }
}
