use charuco_calib::{CalibrationOptions, CalibrationResult, PlanarView};
use charuco_image::{GrayImage, ImageSize};
use charuco_target::{
    CharucoBoard, CharucoCorners, CharucoParams, DetectorParams, Marker, MarkerDetector,
};

use crate::error::VisionError;

/// The corners found in one calibration image.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Pixel positions of the corners.
    pub corner_positions: Vec<[f64; 2]>,
    /// Board corner ids, parallel to `corner_positions`.
    pub corner_ids: Vec<u32>,
    /// Size of the image the corners were found in.
    pub image_size: ImageSize,
}

impl Observation {
    /// Build an observation from interpolated corners.
    pub fn from_corners(corners: &CharucoCorners, image_size: ImageSize) -> Self {
        Self {
            corner_positions: corners
                .positions
                .iter()
                .map(|p| [p[0] as f64, p[1] as f64])
                .collect(),
            corner_ids: corners.ids.clone(),
            image_size,
        }
    }

    /// Number of corners.
    pub fn len(&self) -> usize {
        self.corner_ids.len()
    }

    /// Whether the observation has no corners.
    pub fn is_empty(&self) -> bool {
        self.corner_ids.is_empty()
    }
}

/// The vision operations the workflows need.
///
/// Every call reports failure through [`VisionError`] so that callers decide
/// whether to skip an item or abort.
pub trait VisionBackend {
    /// Detect the board's markers in a grayscale image, sorted by id.
    fn detect_markers(&mut self, gray: &GrayImage) -> Result<Vec<Marker>, VisionError>;

    /// Locate the chessboard corners around the detected markers.
    fn interpolate_corners(
        &mut self,
        markers: &[Marker],
        gray: &GrayImage,
        board: &CharucoBoard,
    ) -> Result<CharucoCorners, VisionError>;

    /// Estimate the camera from all observations.
    fn calibrate_camera(
        &mut self,
        observations: &[Observation],
        board: &CharucoBoard,
        image_size: ImageSize,
    ) -> Result<CalibrationResult, VisionError>;

    /// Render a printable image of the board.
    fn render_board(
        &mut self,
        board: &CharucoBoard,
        size: ImageSize,
        margin: usize,
        border_bits: usize,
    ) -> Result<GrayImage, VisionError>;
}

/// The pure Rust implementation of [`VisionBackend`].
pub struct NativeBackend {
    detector: MarkerDetector,
    charuco: CharucoParams,
    solver: CalibrationOptions,
}

impl NativeBackend {
    /// Create a backend detecting markers of `board`.
    pub fn new(
        board: &CharucoBoard,
        detector: DetectorParams,
        charuco: CharucoParams,
        solver: CalibrationOptions,
    ) -> Self {
        Self {
            detector: MarkerDetector::new(board.dictionary().clone(), detector),
            charuco,
            solver,
        }
    }
}

/// Detect the markers of `board` and, when any are found, interpolate the
/// chessboard corners between them.
pub fn find_board(
    backend: &mut impl VisionBackend,
    gray: &GrayImage,
    board: &CharucoBoard,
) -> Result<(Vec<Marker>, CharucoCorners), VisionError> {
    let markers = backend.detect_markers(gray)?;
    if markers.is_empty() {
        return Ok((markers, CharucoCorners::default()));
    }
    let corners = backend.interpolate_corners(&markers, gray, board)?;
    Ok((markers, corners))
}

/// Pair the corners of each observation with their board coordinates.
pub fn planar_views(
    observations: &[Observation],
    board: &CharucoBoard,
) -> Result<Vec<PlanarView>, VisionError> {
    observations
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            if obs.corner_ids.len() != obs.corner_positions.len() {
                return Err(VisionError::ObservationMismatch(
                    i,
                    obs.corner_positions.len(),
                    obs.corner_ids.len(),
                ));
            }
            let object_points = obs
                .corner_ids
                .iter()
                .map(|&id| {
                    board
                        .chessboard_corner(id)
                        .map(|[x, y, _]| [x, y])
                        .ok_or(VisionError::UnknownCorner(id))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PlanarView {
                object_points,
                image_points: obs.corner_positions.clone(),
            })
        })
        .collect()
}

impl VisionBackend for NativeBackend {
    fn detect_markers(&mut self, gray: &GrayImage) -> Result<Vec<Marker>, VisionError> {
        Ok(self.detector.detect(gray)?)
    }

    fn interpolate_corners(
        &mut self,
        markers: &[Marker],
        gray: &GrayImage,
        board: &CharucoBoard,
    ) -> Result<CharucoCorners, VisionError> {
        Ok(charuco_target::interpolate_corners(
            markers,
            gray,
            board,
            &self.charuco,
        ))
    }

    fn calibrate_camera(
        &mut self,
        observations: &[Observation],
        board: &CharucoBoard,
        image_size: ImageSize,
    ) -> Result<CalibrationResult, VisionError> {
        let views = planar_views(observations, board)?;
        let result = charuco_calib::calibrate_camera(
            &views,
            (image_size.width, image_size.height),
            &self.solver,
        )?;
        Ok(result)
    }

    fn render_board(
        &mut self,
        board: &CharucoBoard,
        size: ImageSize,
        margin: usize,
        border_bits: usize,
    ) -> Result<GrayImage, VisionError> {
        Ok(charuco_target::render_board(board, size, margin, border_bits)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charuco_target::BoardSpec;

    #[test]
    fn views_use_board_coordinates() -> Result<(), Box<dyn std::error::Error>> {
        let board = CharucoBoard::new(BoardSpec::default())?;
        let obs = Observation {
            corner_positions: vec![[10.0, 20.0], [30.0, 40.0]],
            corner_ids: vec![0, 7],
            image_size: [640, 480].into(),
        };
        let views = planar_views(&[obs], &board)?;
        assert_eq!(views[0].object_points, vec![[30.0, 30.0], [60.0, 60.0]]);
        assert_eq!(views[0].image_points, vec![[10.0, 20.0], [30.0, 40.0]]);
        Ok(())
    }

    #[test]
    fn unknown_corner_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let board = CharucoBoard::new(BoardSpec::default())?;
        let obs = Observation {
            corner_positions: vec![[0.0, 0.0]],
            corner_ids: vec![24],
            image_size: [640, 480].into(),
        };
        assert!(matches!(
            planar_views(&[obs], &board),
            Err(VisionError::UnknownCorner(24))
        ));
        Ok(())
    }
}
