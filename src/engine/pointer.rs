//! X11 pointer as a stand-in gaze engine.
//!
//! The pointer position is reported as the gaze point. During calibration
//! the pointer counts as having reached a target once it is inside the
//! target's acceptance radius, so a session can be walked through with the
//! mouse.

use log::info;
use x11rb::{
    connection::Connection,
    protocol::xproto::{ConnectionExt, Window},
    rust_connection::RustConnection,
};

use super::{CalibrationEvent, Frame, GazeEngine, GazeEvent};
use crate::{
    constants::DEFAULT_ACCEPTANCE_RADIUS,
    geometry::{Point, ScreenSize},
    Error, Result,
};

/// Gaze engine reading the X11 pointer
pub struct PointerEngine {
    connection: RustConnection,
    root: Window,
    acceptance_radius: f64,
}

impl PointerEngine {
    /// Connect to the default display
    pub fn new() -> Result<Self> {
        info!("Initializing X11 pointer engine");
        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| Error::EngineInitialization(format!("Failed to connect to X11: {e}")))?;
        let root = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::EngineInitialization("Failed to get screen".to_string()))?
            .root;

        Ok(Self {
            connection,
            root,
            acceptance_radius: DEFAULT_ACCEPTANCE_RADIUS,
        })
    }

    fn pointer(&self) -> Result<Point> {
        let reply = self
            .connection
            .query_pointer(self.root)
            .map_err(|e| Error::Engine(format!("Failed to send query pointer: {e}")))?
            .reply()
            .map_err(|e| Error::Engine(format!("Failed to query pointer: {e}")))?;
        Ok(Point::from((i32::from(reply.root_x), i32::from(reply.root_y))))
    }
}

impl GazeEngine for PointerEngine {
    fn step(
        &mut self,
        _frame: &Frame,
        calibrate: bool,
        _screen: ScreenSize,
        target: Option<Point>,
    ) -> Result<(GazeEvent, Option<CalibrationEvent>)> {
        let pointer = self.pointer()?;
        let gaze = GazeEvent {
            point: Some(pointer),
            fixation: 1.0,
        };
        let calibration = calibrate.then(|| CalibrationEvent {
            point: target.filter(|t| t.distance(&pointer) <= self.acceptance_radius),
            acceptance_radius: self.acceptance_radius,
        });
        Ok((gaze, calibration))
    }

    fn name(&self) -> &str {
        "pointer"
    }
}

/// Size of the default X11 screen
pub fn discover_screen_size() -> Result<ScreenSize> {
    let (connection, screen_num) = RustConnection::connect(None)
        .map_err(|e| Error::InvalidInput(format!("Failed to connect to X11: {e}")))?;
    let screen = connection
        .setup()
        .roots
        .get(screen_num)
        .ok_or_else(|| Error::InvalidInput("Failed to get screen".to_string()))?;

    info!(
        "Connected to X11 display, screen: {}x{}",
        screen.width_in_pixels, screen.height_in_pixels
    );
    Ok(ScreenSize::new(
        f64::from(screen.width_in_pixels),
        f64::from(screen.height_in_pixels),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires X11 display
    fn test_pointer_reaches_target_under_it() {
        let mut engine = PointerEngine::new().unwrap();
        let screen = discover_screen_size().unwrap();
        let frame = Frame::blank(1, 1);

        let (gaze, calibration) = engine.step(&frame, false, screen, None).unwrap();
        let pointer = gaze.point.unwrap();
        assert!(calibration.is_none());
        assert!(pointer.x >= 0.0 && pointer.x < screen.width);
        assert!(pointer.y >= 0.0 && pointer.y < screen.height);

        let (_, calibration) = engine.step(&frame, true, screen, Some(pointer)).unwrap();
        assert_eq!(calibration.unwrap().point, Some(pointer));

        let far = Point::new(pointer.x + 10.0 * DEFAULT_ACCEPTANCE_RADIUS, pointer.y);
        let (_, calibration) = engine.step(&frame, true, screen, Some(far)).unwrap();
        let calibration = calibration.unwrap();
        assert_eq!(calibration.point, None);
        assert!((calibration.acceptance_radius - DEFAULT_ACCEPTANCE_RADIUS).abs() < f64::EPSILON);
    }
}
