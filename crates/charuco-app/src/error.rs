use std::path::PathBuf;

use charuco_calib::CalibError;
use charuco_io::IoError;
use charuco_target::TargetError;

/// An error reported by a [`VisionBackend`](crate::backend::VisionBackend).
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// Board, detection or rendering failure.
    #[error(transparent)]
    Target(#[from] TargetError),

    /// The solver failed or produced a degenerate camera.
    #[error("Calibration failed. {0}")]
    Calibration(#[from] CalibError),

    /// A corner id is not on the board.
    #[error("Corner id {0} is not on the board")]
    UnknownCorner(u32),

    /// Corner positions and ids of an observation differ in length.
    #[error("Observation {0} has {1} positions but {2} ids")]
    ObservationMismatch(usize, usize, usize),
}

/// An error that ends a capture session.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The camera could not be opened.
    #[error("Camera {0} is unavailable: {1}")]
    DeviceUnavailable(usize, String),

    /// Reading a frame or writing an image failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// A frame could not be converted.
    #[error(transparent)]
    Image(#[from] charuco_image::ImageError),

    /// Terminal input could not be read.
    #[error("Failed to poll the keyboard. {0}")]
    Terminal(#[from] std::io::Error),

    /// The preview could not be updated.
    #[error("Preview failed. {0}")]
    Preview(String),
}

/// Top level error of the tool.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// A vision library call failed.
    #[error(transparent)]
    Vision(#[from] VisionError),

    /// The capture session failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The configuration file could not be read.
    #[error("Failed to read configuration {0}. {1}")]
    ConfigRead(PathBuf, std::io::Error),

    /// The configuration file is not valid JSON for the configuration.
    #[error("Invalid configuration {0}. {1}")]
    ConfigParse(PathBuf, serde_json::Error),

    /// The marker table file could not be read.
    #[error("Failed to read marker dictionary {0}. {1}")]
    DictionaryRead(PathBuf, std::io::Error),

    /// The marker table file is not a valid dictionary export.
    #[error("Invalid marker dictionary {0}. {1}")]
    DictionaryParse(PathBuf, serde_json::Error),

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration. {0}")]
    ConfigSerialize(#[from] serde_json::Error),

    /// The configuration holds inconsistent values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No image of the set carried enough corners.
    #[error("No usable calibration images in {0}")]
    NoObservations(PathBuf),
}

impl From<TargetError> for AppError {
    fn from(e: TargetError) -> Self {
        Self::Vision(VisionError::Target(e))
    }
}
