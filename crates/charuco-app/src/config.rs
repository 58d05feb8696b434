use std::path::{Path, PathBuf};

use charuco_calib::{CalibrationOptions, MIN_POINTS_PER_VIEW};
use charuco_target::{
    BoardSpec, CharucoBoard, CharucoParams, DetectorParams, Dictionary, DictionaryData,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Directory, below the working directory, that receives the generated artifacts.
pub const OUT_DIR: &str = "out";
/// Directory, below the working directory, holding the calibration images.
pub const IMAGE_DIR: &str = "imgs-cal";
/// File name of the generated board.
pub const BOARD_FILE: &str = "calibration-charuco.png";
/// File name of the persisted camera matrix.
pub const CAMERA_MATRIX_FILE: &str = "camera_matrix_new.npy";
/// File name of the persisted distortion coefficients.
pub const DIST_COEFFS_FILE: &str = "dist_coeffs_new.npy";

/// Camera device settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Index `k` of `/dev/video<k>`.
    pub device: usize,
    /// Requested frame width.
    pub width: usize,
    /// Requested frame height.
    pub height: usize,
    /// Maximum time to wait for a frame, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 4,
            width: 640,
            height: 480,
            timeout_ms: 2000,
        }
    }
}

/// Board image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// White margin around the board in pixels.
    pub margin: usize,
    /// Width of the black marker border in cells.
    pub border_bits: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1400,
            margin: 0,
            border_bits: 1,
        }
    }
}

/// Capture session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Number of images to save before the session ends.
    pub target_count: usize,
    /// Corners a frame needs before it may be saved.
    pub min_save_corners: usize,
    /// Show the live preview.
    pub preview: bool,
    /// Keyboard poll timeout in milliseconds.
    pub key_poll_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_count: 50,
            min_save_corners: 4,
            preview: true,
            key_poll_ms: 1,
        }
    }
}

/// Calibration runner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Corners an image needs to be used.
    pub min_accept_corners: usize,
    /// Warn when fewer images are usable.
    pub min_views_warning: usize,
    /// Solver options.
    pub solver: CalibrationOptions,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_accept_corners: 4,
            min_views_warning: 10,
            solver: CalibrationOptions::default(),
        }
    }
}

/// The complete configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of `out/` and `imgs-cal/`.
    pub workdir: PathBuf,
    /// The calibration board.
    pub board: BoardSpec,
    /// Marker table exported from OpenCV as JSON, used instead of
    /// `board.dictionary`.
    pub dictionary_file: Option<PathBuf>,
    /// Camera used for capture.
    pub camera: CameraConfig,
    /// Generated board image.
    pub render: RenderConfig,
    /// Interactive capture.
    pub capture: CaptureConfig,
    /// Batch calibration.
    pub calibration: CalibrationConfig,
    /// Marker detector tuning.
    pub detector: DetectorParams,
    /// Corner interpolation tuning.
    pub charuco: CharucoParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            board: BoardSpec::default(),
            dictionary_file: None,
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
            capture: CaptureConfig::default(),
            calibration: CalibrationConfig::default(),
            detector: DetectorParams::default(),
            charuco: CharucoParams::default(),
        }
    }
}

impl AppConfig {
    /// Load a JSON configuration. Missing fields take their default value.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::ConfigRead(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| AppError::ConfigParse(path.to_path_buf(), e))
    }

    /// The configuration as pretty printed JSON.
    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the values the board constructor does not cover.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.render.width == 0 || self.render.height == 0 {
            return Err(AppError::InvalidConfig(format!(
                "render size {}x{} must be positive",
                self.render.width, self.render.height
            )));
        }
        if self.capture.target_count == 0 {
            return Err(AppError::InvalidConfig(
                "capture.target_count must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("capture.min_save_corners", self.capture.min_save_corners),
            ("calibration.min_accept_corners", self.calibration.min_accept_corners),
        ] {
            if value < MIN_POINTS_PER_VIEW {
                return Err(AppError::InvalidConfig(format!(
                    "{name} is {value}, the solver needs at least {MIN_POINTS_PER_VIEW}"
                )));
            }
        }
        if self.detector.threshold_windows.iter().any(|&w| w < 3) {
            return Err(AppError::InvalidConfig(
                "detector.threshold_windows must be at least 3".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the board, loading `dictionary_file` when set.
    pub fn build_board(&self) -> Result<CharucoBoard, AppError> {
        let Some(path) = &self.dictionary_file else {
            return Ok(CharucoBoard::new(self.board)?);
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::DictionaryRead(path.clone(), e))?;
        let data: DictionaryData = serde_json::from_str(&text)
            .map_err(|e| AppError::DictionaryParse(path.clone(), e))?;
        let dictionary = Dictionary::from_data(&data)?;
        log::info!(
            "loaded {} markers of {}x{} bits from {}",
            dictionary.len(),
            data.marker_size,
            data.marker_size,
            path.display()
        );
        Ok(CharucoBoard::with_dictionary(self.board, dictionary)?)
    }

    /// `<workdir>/out`.
    pub fn out_dir(&self) -> PathBuf {
        self.workdir.join(OUT_DIR)
    }

    /// `<workdir>/imgs-cal`.
    pub fn image_dir(&self) -> PathBuf {
        self.workdir.join(IMAGE_DIR)
    }
}
