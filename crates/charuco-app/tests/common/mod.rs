#![allow(dead_code)]

use charuco_app::{Observation, VisionBackend, VisionError};
use charuco_calib::{CalibError, CalibrationResult};
use charuco_image::{GrayImage, Image, ImageSize};
use charuco_target::{CharucoBoard, CharucoCorners, Marker, TargetError};

pub const CAMERA_MATRIX: [[f64; 3]; 3] = [[512.5, 0.0, 319.75], [0.0, 508.25, 241.0], [0.0, 0.0, 1.0]];
pub const DIST_COEFFS: [f64; 5] = [-0.125, 0.0625, 0.001, -0.002, 0.0];

/// Scene value for which marker detection fails.
pub const FAILING_SCENE: u8 = 255;

/// A backend reading the scene from the first pixel: 0 means no markers,
/// [`FAILING_SCENE`] makes detection fail and any other value `v` yields
/// `v` chessboard corners.
#[derive(Default)]
pub struct MockBackend {
    /// Corner counts of the observations passed to each solver call.
    pub calibrations: Vec<Vec<usize>>,
    /// Make the solver fail.
    pub fail_solver: bool,
}

fn scene_value(gray: &GrayImage) -> u8 {
    gray.as_slice().first().copied().unwrap_or(0)
}

impl VisionBackend for MockBackend {
    fn detect_markers(&mut self, gray: &GrayImage) -> Result<Vec<Marker>, VisionError> {
        match scene_value(gray) {
            0 => return Ok(Vec::new()),
            FAILING_SCENE => return Err(TargetError::MarkerMismatch.into()),
            _ => {}
        }
        Ok(vec![Marker {
            id: 0,
            corners: [[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0]],
        }])
    }

    fn interpolate_corners(
        &mut self,
        _markers: &[Marker],
        gray: &GrayImage,
        _board: &CharucoBoard,
    ) -> Result<CharucoCorners, VisionError> {
        let ids: Vec<u32> = (0..scene_value(gray) as u32).collect();
        Ok(CharucoCorners {
            positions: ids.iter().map(|&id| [id as f32, 1.0]).collect(),
            ids,
        })
    }

    fn calibrate_camera(
        &mut self,
        observations: &[Observation],
        _board: &CharucoBoard,
        _image_size: ImageSize,
    ) -> Result<CalibrationResult, VisionError> {
        self.calibrations
            .push(observations.iter().map(Observation::len).collect());
        if self.fail_solver {
            return Err(CalibError::DegenerateIntrinsics.into());
        }
        Ok(CalibrationResult {
            reprojection_error: 0.25,
            camera_matrix: CAMERA_MATRIX,
            dist_coeffs: DIST_COEFFS,
            view_poses: Vec::new(),
            per_view_errors: vec![0.25; observations.len()],
        })
    }

    fn render_board(
        &mut self,
        _board: &CharucoBoard,
        size: ImageSize,
        _margin: usize,
        _border_bits: usize,
    ) -> Result<GrayImage, VisionError> {
        Ok(Image::from_size_val(size, 255))
    }
}

/// A uniform grayscale image whose value encodes the scene.
pub fn scene(value: u8) -> GrayImage {
    Image::from_size_val([32, 24].into(), value)
}
