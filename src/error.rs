//! Error types for the gaze session library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Camera could not be opened or stopped delivering frames
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// A single frame could not be read
    #[error("Frame read failed: {0}")]
    FrameRead(String),

    /// Gaze engine failed on one frame
    #[error("Engine error: {0}")]
    Engine(String),

    /// Gaze engine could not be brought up at all
    #[error("Engine initialization failed: {0}")]
    EngineInitialization(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "opencv")]
impl From<opencv::Error> for Error {
    fn from(e: opencv::Error) -> Self {
        Self::CameraUnavailable(e.to_string())
    }
}
