//! Configuration loading and validation tests

use std::time::Duration;

use gaze_session::{
    calibration::CalibrationLayout,
    config::{Config, EXAMPLE_CONFIG},
    Error,
};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("gaze_session_{}_{}.yaml", name, std::process::id()))
}

#[test]
fn test_round_trip_through_file() {
    let path = temp_path("round_trip");
    let mut config = Config::default();
    config.smoothing.alpha = 0.4;
    config.calibration.layout = CalibrationLayout::NinePoint;
    config.server.port = 9123;
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!((loaded.smoothing.alpha - 0.4).abs() < f64::EPSILON);
    assert_eq!(loaded.calibration.layout, CalibrationLayout::NinePoint);
    assert_eq!(loaded.server.port, 9123);
    loaded.validate().unwrap();
}

#[test]
fn test_example_config_matches_defaults() {
    let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
    let defaults = Config::default();

    assert!((parsed.smoothing.alpha - defaults.smoothing.alpha).abs() < f64::EPSILON);
    assert!((parsed.clustering.eps - defaults.clustering.eps).abs() < f64::EPSILON);
    assert_eq!(parsed.clustering.min_samples, defaults.clustering.min_samples);
    assert_eq!(parsed.clustering.buffer_capacity, defaults.clustering.buffer_capacity);
    assert_eq!(parsed.calibration.layout, defaults.calibration.layout);
    assert_eq!(parsed.calibration.timeout(), Duration::from_secs(60));
    assert_eq!(parsed.session.loop_interval(), Duration::from_millis(10));
    assert_eq!(parsed.session.read_backoff(), Duration::from_millis(100));
    assert_eq!(parsed.server.port, 8000);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = Config::from_file(temp_path("does_not_exist"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let path = temp_path("malformed");
    std::fs::write(&path, "smoothing: [not, a, map").unwrap();
    let result = Config::from_file(&path);
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_validation_covers_every_section() {
    let cases: Vec<fn(&mut Config)> = vec![
        |c| c.screen.height = 0.0,
        |c| c.smoothing.alpha = 1.01,
        |c| c.clustering.eps = 0.0,
        |c| c.clustering.buffer_capacity = 0,
        |c| c.clustering.default_strategy = "kmeans".to_string(),
        |c| {
            c.calibration.layout = CalibrationLayout::Grid {
                resolution: 6,
                shuffle: true,
                max_points: 0,
            }
        },
        |c| c.calibration.timeout_secs = 0,
        |c| c.session.preemption_grace_ms = 0,
        |c| c.session.max_read_failures = 0,
        |c| c.camera.fps = 0.0,
        |c| c.camera.fps = -1.0,
        |c| c.camera.fps = f64::NAN,
        |c| c.camera.fps = f64::INFINITY,
        |c| c.camera.fps = 5000.0,
    ];

    for (i, mutate) in cases.into_iter().enumerate() {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(
            matches!(config.validate(), Err(Error::ConfigError(_))),
            "case {i} should be rejected"
        );
    }
}
