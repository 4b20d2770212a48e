//! Tracking and calibration loops run on their own threads.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Instant,
};

use log::{debug, error, info, warn};

use super::{lock, LoopError, SessionController, Shared, StartOutcome};
use crate::{
    calibration::{generate_targets, Acceptance, CalibrationSequencer, Rejection},
    config::SessionConfig,
    constants::GAZE_LOG_THRESHOLD,
    engine::{CameraGuard, Frame},
    geometry::Point,
    zones::ZoneTracker,
};

/// Counts a running loop and hands the camera back on every exit path
struct LoopLease<'a> {
    shared: &'a Shared,
    error: Option<LoopError>,
}

impl<'a> LoopLease<'a> {
    fn enter(shared: &'a Shared) -> Self {
        let live = shared.live_loops.fetch_add(1, Ordering::AcqRel) + 1;
        shared.peak_live_loops.fetch_max(live, Ordering::AcqRel);
        Self { shared, error: None }
    }
}

impl Drop for LoopLease<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Worker loop panicked, releasing the session");
            self.error.get_or_insert(LoopError::CameraLost);
        }
        self.shared.live_loops.fetch_sub(1, Ordering::AcqRel);
        self.shared.release_state(self.error);
    }
}

enum FrameRead {
    Frame(Frame),
    Retry,
    Lost,
}

fn read_frame(camera: &mut CameraGuard, failures: &mut u32, session: &SessionConfig) -> FrameRead {
    match camera.read() {
        Ok(frame) => {
            *failures = 0;
            FrameRead::Frame(frame)
        }
        Err(e) => {
            *failures += 1;
            if *failures >= session.max_read_failures {
                error!("Camera lost after {} failed reads: {}", failures, e);
                FrameRead::Lost
            } else {
                warn!("Failed to read frame, retrying: {}", e);
                thread::sleep(session.read_backoff());
                FrameRead::Retry
            }
        }
    }
}

pub(super) fn run_tracking(shared: &Shared, camera: CameraGuard, stop: &AtomicBool) {
    let mut lease = LoopLease::enter(shared);
    let mut camera = camera;
    let mut filter = lock(&shared.filter);
    filter.reset();

    let screen = shared.config.screen.size();
    let session = &shared.config.session;
    let interval = session.loop_interval();
    let mut failures = 0;
    let mut zones = ZoneTracker::default();
    let mut last_logged: Option<Point> = None;

    while !stop.load(Ordering::Acquire) {
        let frame = match read_frame(&mut camera, &mut failures, session) {
            FrameRead::Frame(frame) => frame,
            FrameRead::Retry => continue,
            FrameRead::Lost => {
                lease.error = Some(LoopError::CameraLost);
                break;
            }
        };

        let result = lock(&shared.engine).step(&frame, false, screen, None);
        match result {
            Ok((gaze, _)) => {
                if let Some(sample) = gaze.into_sample(Instant::now()) {
                    lock(&shared.buffer).push(sample.point);
                    let smoothed = filter.apply(sample.point);
                    shared.status.set_gaze(smoothed);

                    if let Some(zone) = zones.update(smoothed, screen) {
                        debug!("Gaze moved to zone {}", zone.as_str());
                        shared.status.set_zone(zone);
                    }
                    if last_logged.map_or(true, |last| last.distance(&smoothed) > GAZE_LOG_THRESHOLD) {
                        info!("Gaze point ({:.0}, {:.0})", smoothed.x, smoothed.y);
                        last_logged = Some(smoothed);
                    }
                }
            }
            Err(e) => debug!("Engine step failed: {}", e),
        }

        thread::sleep(interval);
    }

    drop(filter);
    camera.release();
    info!("Tracking loop stopped");
    drop(lease);
}

pub(super) fn run_calibration(
    controller: &SessionController,
    camera: CameraGuard,
    cancel: &AtomicBool,
    resume_tracking: bool,
) {
    let shared = controller.shared.as_ref();
    let mut lease = LoopLease::enter(shared);
    let mut camera = camera;

    let config = &shared.config;
    let screen = config.screen.size();
    let interval = config.session.loop_interval();
    let targets = generate_targets(
        &config.calibration.layout,
        screen,
        config.calibration.acceptance_radius,
        &mut rand::thread_rng(),
    );
    let mut sequencer = CalibrationSequencer::new(targets, config.calibration.timeout());
    sequencer.start(Instant::now());
    shared.status.set_progress(sequencer.progress());
    let mut failures = 0;

    loop {
        if cancel.load(Ordering::Acquire) {
            sequencer.cancel();
        }
        if sequencer.tick(Instant::now()).is_terminal() {
            break;
        }

        let frame = match read_frame(&mut camera, &mut failures, &config.session) {
            FrameRead::Frame(frame) => frame,
            FrameRead::Retry => continue,
            FrameRead::Lost => {
                lease.error = Some(LoopError::CameraLost);
                sequencer.cancel();
                break;
            }
        };

        let target = sequencer.current_target().map(|t| t.pixel);
        let result = lock(&shared.engine).step(&frame, true, screen, target);
        let (candidate, radius) = match result {
            Ok((_, Some(event))) => (event.point, event.acceptance_radius),
            Ok((_, None)) => (None, sequencer.acceptance_radius()),
            Err(e) => {
                debug!("Engine step failed during calibration: {}", e);
                (None, sequencer.acceptance_radius())
            }
        };
        match sequencer.observe(candidate, radius, Instant::now()) {
            Acceptance::Advanced { .. } | Acceptance::Completed => {
                shared.status.set_progress(sequencer.progress());
            }
            Acceptance::Rejected(Rejection::NoCandidate) => {}
            Acceptance::Rejected(reason) => debug!("Calibration candidate rejected: {:?}", reason),
        }

        thread::sleep(interval);
    }

    shared.status.set_progress(sequencer.progress());
    shared.status.set_calibration_result(Some(sequencer.state()));
    camera.release();
    let camera_lost = lease.error.is_some();
    drop(lease);

    if resume_tracking && !camera_lost && !shared.is_shutting_down() {
        info!("Resuming tracking after calibration");
        let outcome = controller.start_tracking();
        if outcome != StartOutcome::Started {
            warn!("Tracking did not resume: {}", outcome.as_str());
        }
    }
}
