use std::path::{Path, PathBuf};

use charuco_calib::CalibrationResult;
use charuco_image::{GrayImage, ImageSize};
use charuco_io::{
    npy::{write_camera_matrix, write_dist_coeffs},
    png::read_image_png_mono8,
    ImageSet,
};
use charuco_target::CharucoBoard;

use crate::{
    backend::{find_board, Observation, VisionBackend},
    config::{AppConfig, CAMERA_MATRIX_FILE, DIST_COEFFS_FILE},
    error::AppError,
};

/// Why an image did not contribute to the calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No marker was detected.
    NoMarkers,
    /// Markers were found but too few chessboard corners.
    NotEnoughCorners(usize),
    /// The vision backend reported an error for this image.
    DetectionFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoMarkers => f.write_str("no markers"),
            SkipReason::NotEnoughCorners(n) => write!(f, "not enough charuco corners ({n})"),
            SkipReason::DetectionFailed(e) => write!(f, "detection failed: {e}"),
        }
    }
}

/// An image that was left out of the calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedImage {
    /// The image file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Files written by a successful calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationArtifacts {
    /// The 3x3 camera matrix.
    pub camera_matrix: PathBuf,
    /// The 1x5 distortion coefficients.
    pub dist_coeffs: PathBuf,
}

/// Outcome of a calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationReport {
    /// The estimated camera.
    pub result: CalibrationResult,
    /// Images that contributed an observation, in manifest order.
    pub used_images: Vec<PathBuf>,
    /// Images that were left out.
    pub skipped: Vec<SkippedImage>,
    /// The written files.
    pub artifacts: CalibrationArtifacts,
}

/// Observations gathered from an image set.
#[derive(Debug, Clone, Default)]
pub struct ObservationSet {
    /// One observation per usable image.
    pub observations: Vec<Observation>,
    /// The images behind `observations`.
    pub used_images: Vec<PathBuf>,
    /// Images without enough corners.
    pub skipped: Vec<SkippedImage>,
    /// Size of the first image.
    pub image_size: Option<ImageSize>,
}

fn observe(
    gray: &GrayImage,
    board: &CharucoBoard,
    backend: &mut impl VisionBackend,
    min_corners: usize,
) -> Result<Observation, SkipReason> {
    let (markers, corners) = find_board(backend, gray, board)
        .map_err(|e| SkipReason::DetectionFailed(e.to_string()))?;
    if markers.is_empty() {
        return Err(SkipReason::NoMarkers);
    }
    if corners.len() < min_corners {
        return Err(SkipReason::NotEnoughCorners(corners.len()));
    }
    Ok(Observation::from_corners(&corners, gray.size()))
}

/// Detect the board in every image of the set, in manifest order.
pub fn collect_observations(
    images: &ImageSet,
    board: &CharucoBoard,
    backend: &mut impl VisionBackend,
    min_corners: usize,
) -> Result<ObservationSet, AppError> {
    let mut set = ObservationSet::default();

    for entry in images.entries() {
        let gray = read_image_png_mono8(&entry.path)?;

        match set.image_size {
            None => set.image_size = Some(gray.size()),
            Some(size) if size != gray.size() => log::warn!(
                "{} is {}x{}, expected {}x{}",
                entry.path.display(),
                gray.width(),
                gray.height(),
                size.width,
                size.height
            ),
            Some(_) => {}
        }

        match observe(&gray, board, backend, min_corners) {
            Ok(observation) => {
                log::debug!(
                    "{}: {} corners",
                    entry.path.display(),
                    observation.len()
                );
                set.observations.push(observation);
                set.used_images.push(entry.path.clone());
            }
            Err(reason) => {
                log::info!("skipping {}: {reason}", entry.path.display());
                set.skipped.push(SkippedImage {
                    path: entry.path.clone(),
                    reason,
                });
            }
        }
    }

    Ok(set)
}

/// Calibrate the camera from the images in `<workdir>/imgs-cal`.
///
/// Writes `camera_matrix_new.npy` and `dist_coeffs_new.npy` to
/// `<workdir>/out`, overwriting earlier results. Nothing is written when no
/// image is usable or the solver fails.
pub fn run_calibration(
    config: &AppConfig,
    board: &CharucoBoard,
    backend: &mut impl VisionBackend,
) -> Result<CalibrationReport, AppError> {
    let settings = &config.calibration;
    let image_dir = config.image_dir();
    let images = ImageSet::scan(&image_dir)?;
    log::info!("calibrating from {} images in {}", images.len(), image_dir.display());

    let set = collect_observations(&images, board, backend, settings.min_accept_corners)?;
    let Some(image_size) = set.image_size.filter(|_| !set.observations.is_empty()) else {
        return Err(AppError::NoObservations(image_dir));
    };

    if set.observations.len() < settings.min_views_warning {
        log::warn!(
            "only {} usable images, at least {} are recommended",
            set.observations.len(),
            settings.min_views_warning
        );
    }

    let result = backend.calibrate_camera(&set.observations, board, image_size)?;
    let artifacts = write_artifacts(&config.out_dir(), &result)?;

    log::info!("reprojection error: {:.4} px", result.reprojection_error);
    log::info!("camera matrix: {:?}", result.camera_matrix);
    log::info!("distortion coefficients: {:?}", result.dist_coeffs);

    Ok(CalibrationReport {
        result,
        used_images: set.used_images,
        skipped: set.skipped,
        artifacts,
    })
}

fn write_artifacts(out_dir: &Path, result: &CalibrationResult) -> Result<CalibrationArtifacts, AppError> {
    std::fs::create_dir_all(out_dir).map_err(charuco_io::IoError::from)?;

    let artifacts = CalibrationArtifacts {
        camera_matrix: out_dir.join(CAMERA_MATRIX_FILE),
        dist_coeffs: out_dir.join(DIST_COEFFS_FILE),
    };
    write_camera_matrix(&artifacts.camera_matrix, &result.camera_matrix)?;
    write_dist_coeffs(&artifacts.dist_coeffs, &result.dist_coeffs)?;
    log::info!(
        "wrote {} and {}",
        artifacts.camera_matrix.display(),
        artifacts.dist_coeffs.display()
    );
    Ok(artifacts)
}
