#![deny(missing_docs)]
//! Planar camera calibration.
//!
//! Estimates a pinhole camera matrix and Brown-Conrady distortion from
//! several views of a planar target: a normalised DLT homography per view,
//! a closed-form initialisation of the camera matrix, a pose per view and a
//! joint Levenberg–Marquardt refinement of all parameters.

/// Pinhole camera model with lens distortion.
pub mod camera;

/// Error types for the calibration module.
pub mod error;

/// Homography estimation.
pub mod homography;

/// Initialisation of the camera matrix.
pub mod intrinsics;

/// Board pose from a homography.
pub mod pose;

/// Non-linear refinement.
pub mod refine;

use serde::{Deserialize, Serialize};

pub use crate::camera::{CameraIntrinsics, DistortionCoeffs, Pose};
pub use crate::error::CalibError;
pub use crate::refine::LMParams;

/// Minimum number of correspondences per view.
pub const MIN_POINTS_PER_VIEW: usize = 4;

/// Correspondences between points on the board plane and their pixel positions in one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanarView {
    /// Board coordinates on the `z = 0` plane.
    pub object_points: Vec<[f64; 2]>,
    /// Observed pixel coordinates, one per object point.
    pub image_points: Vec<[f64; 2]>,
}

impl PlanarView {
    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.object_points.len()
    }

    /// Whether the view has no correspondences.
    pub fn is_empty(&self) -> bool {
        self.object_points.is_empty()
    }
}

/// Options of [`calibrate_camera`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationOptions {
    /// Keep the sixth order radial coefficient at zero.
    pub fix_k3: bool,
    /// Keep the tangential coefficients at zero.
    pub zero_tangent_dist: bool,
    /// Settings of the non-linear refinement.
    pub lm: LMParams,
}

/// Pose of the board in one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPose {
    /// Axis-angle rotation from board to camera.
    pub rvec: [f64; 3],
    /// Translation from board to camera, in board units.
    pub tvec: [f64; 3],
}

impl From<&Pose> for ViewPose {
    fn from(pose: &Pose) -> Self {
        Self {
            rvec: pose.rvec(),
            tvec: pose.tvec(),
        }
    }
}

/// The estimated camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Root-mean-square reprojection error over all points, in pixels.
    pub reprojection_error: f64,
    /// The camera matrix.
    pub camera_matrix: [[f64; 3]; 3],
    /// Distortion coefficients `[k1, k2, p1, p2, k3]`.
    pub dist_coeffs: [f64; 5],
    /// Board pose per view.
    pub view_poses: Vec<ViewPose>,
    /// Root-mean-square reprojection error per view.
    pub per_view_errors: Vec<f64>,
}

fn validate_views(views: &[PlanarView], options: &CalibrationOptions) -> Result<(), CalibError> {
    if views.is_empty() {
        return Err(CalibError::NoViews);
    }

    let mut residuals = 0;
    for (i, view) in views.iter().enumerate() {
        if view.object_points.len() != view.image_points.len() {
            return Err(CalibError::PointCountMismatch(
                i,
                view.object_points.len(),
                view.image_points.len(),
            ));
        }
        if view.len() < MIN_POINTS_PER_VIEW {
            return Err(CalibError::TooFewPoints(i, view.len(), MIN_POINTS_PER_VIEW));
        }
        residuals += 2 * view.len();
    }

    let mask = refine::ParameterMask {
        fix_k3: options.fix_k3,
        zero_tangent_dist: options.zero_tangent_dist,
    };
    let params = mask.num_free_intrinsics() + refine::NUM_POSE_PARAMS * views.len();
    if residuals < params {
        return Err(CalibError::Underdetermined(residuals, params));
    }
    Ok(())
}

/// Estimate the camera matrix and distortion from views of a planar target.
///
/// # Arguments
///
/// * `views` - The correspondences of each view, at least 4 per view.
/// * `image_size` - `(width, height)` of the images in pixels.
/// * `options` - Which parameters to keep fixed and the refinement settings.
///
/// # Returns
///
/// The camera, the pose of each view and the reprojection errors.
pub fn calibrate_camera(
    views: &[PlanarView],
    image_size: (usize, usize),
    options: &CalibrationOptions,
) -> Result<CalibrationResult, CalibError> {
    let (width, height) = image_size;
    if width == 0 || height == 0 {
        return Err(CalibError::InvalidImageSize(width, height));
    }
    validate_views(views, options)?;

    let homographies = views
        .iter()
        .map(|v| homography::find_homography_dlt(&v.object_points, &v.image_points))
        .collect::<Result<Vec<_>, _>>()?;

    let mut k = intrinsics::initialize_intrinsics(&homographies, width, height)?;
    log::debug!(
        "initial intrinsics: fx {:.2} fy {:.2} cx {:.2} cy {:.2}",
        k.fx,
        k.fy,
        k.cx,
        k.cy
    );

    let mut poses = homographies
        .iter()
        .map(|h| pose::pose_from_homography(&k, h))
        .collect::<Result<Vec<_>, _>>()?;

    let mut dist = DistortionCoeffs::default();
    let mask = refine::ParameterMask {
        fix_k3: options.fix_k3,
        zero_tangent_dist: options.zero_tangent_dist,
    };
    let report = refine::refine_calibration(views, &mut k, &mut dist, &mut poses, &mask, &options.lm)?;
    if !report.converged {
        log::warn!(
            "calibration refinement stopped after {} iterations without converging",
            report.iterations
        );
    }

    if !k.is_valid() {
        return Err(CalibError::DegenerateIntrinsics);
    }

    let num_points: usize = views.iter().map(PlanarView::len).sum();
    let reprojection_error = (report.cost / num_points as f64).sqrt();
    if !reprojection_error.is_finite() || dist.to_array().iter().any(|v| !v.is_finite()) {
        return Err(CalibError::NonFinite);
    }

    let per_view_errors = views
        .iter()
        .zip(poses.iter())
        .map(|(view, pose)| refine::view_rms(&k, &dist, pose, view))
        .collect();

    Ok(CalibrationResult {
        reprojection_error,
        camera_matrix: k.to_array(),
        dist_coeffs: dist.to_array(),
        view_poses: poses.iter().map(ViewPose::from).collect(),
        per_view_errors,
    })
}
