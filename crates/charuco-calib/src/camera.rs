//! Pinhole camera with Brown-Conrady lens distortion.

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Represents the intrinsic parameters of a pinhole camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in x direction
    pub fx: f64,
    /// Focal length in y direction
    pub fy: f64,
    /// Principal point x coordinate
    pub cx: f64,
    /// Principal point y coordinate
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Create camera intrinsics from focal lengths and principal point.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Read the intrinsics from a camera matrix, ignoring skew.
    pub fn from_matrix(k: &Matrix3<f64>) -> Self {
        Self {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
            cx: k[(0, 2)],
            cy: k[(1, 2)],
        }
    }

    /// The camera matrix `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0)
    }

    /// Row-major array form of the camera matrix.
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Whether the focal lengths are positive and every entry is finite.
    pub fn is_valid(&self) -> bool {
        [self.fx, self.fy, self.cx, self.cy]
            .iter()
            .all(|v| v.is_finite())
            && self.fx > 0.0
            && self.fy > 0.0
    }
}

/// Brown-Conrady distortion coefficients in the `(k1, k2, p1, p2, k3)` order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct DistortionCoeffs {
    /// Radial coefficients
    pub k1: f64,
    pub k2: f64,
    /// Tangential coefficients
    pub p1: f64,
    pub p2: f64,
    /// Sixth order radial coefficient
    pub k3: f64,
}

impl DistortionCoeffs {
    /// Build from `[k1, k2, p1, p2, k3]`.
    pub fn from_array(d: [f64; 5]) -> Self {
        Self {
            k1: d[0],
            k2: d[1],
            p1: d[2],
            p2: d[3],
            k3: d[4],
        }
    }

    /// The coefficients as `[k1, k2, p1, p2, k3]`.
    pub fn to_array(&self) -> [f64; 5] {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
    }

    /// Apply the distortion to a point on the normalised image plane.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let kr = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let xd = x * kr + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * kr + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (xd, yd)
    }
}

/// Rigid transform from the board frame to the camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Rotation from board to camera
    pub rotation: Rotation3<f64>,
    /// Board origin in camera coordinates
    pub translation: Vector3<f64>,
}

impl Pose {
    /// Axis-angle rotation vector.
    pub fn rvec(&self) -> [f64; 3] {
        let r = self.rotation.scaled_axis();
        [r.x, r.y, r.z]
    }

    /// Translation vector.
    pub fn tvec(&self) -> [f64; 3] {
        [self.translation.x, self.translation.y, self.translation.z]
    }

    /// Build from an axis-angle rotation vector and a translation.
    pub fn from_rvec_tvec(rvec: [f64; 3], tvec: [f64; 3]) -> Self {
        Self {
            rotation: Rotation3::new(Vector3::from(rvec)),
            translation: Vector3::from(tvec),
        }
    }
}

/// Project a point on the board plane (`z = 0`) to pixels.
///
/// Returns `None` when the point lies behind the camera.
pub fn project_board_point(
    intrinsics: &CameraIntrinsics,
    distortion: &DistortionCoeffs,
    pose: &Pose,
    p: [f64; 2],
) -> Option<[f64; 2]> {
    let pc = pose.rotation * Vector3::new(p[0], p[1], 0.0) + pose.translation;
    if pc.z <= f64::EPSILON {
        return None;
    }
    let (xd, yd) = distortion.distort(pc.x / pc.z, pc.y / pc.z);
    Some([
        intrinsics.fx * xd + intrinsics.cx,
        intrinsics.fy * yd + intrinsics.cy,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_distortion_is_pinhole() {
        let k = CameraIntrinsics::new(500.0, 400.0, 320.0, 240.0);
        let pose = Pose::from_rvec_tvec([0.0; 3], [0.0, 0.0, 100.0]);
        let uv = project_board_point(&k, &DistortionCoeffs::default(), &pose, [10.0, -20.0]);
        let [u, v] = uv.unwrap_or([f64::NAN; 2]);
        assert_relative_eq!(u, 370.0, epsilon = 1e-9);
        assert_relative_eq!(v, 160.0, epsilon = 1e-9);
    }

    #[test]
    fn radial_distortion_pushes_outward() {
        let d = DistortionCoeffs::from_array([0.1, 0.0, 0.0, 0.0, 0.0]);
        let (xd, yd) = d.distort(0.5, 0.0);
        assert_relative_eq!(xd, 0.5 * (1.0 + 0.1 * 0.25));
        assert_eq!(yd, 0.0);
        assert_eq!(d.to_array(), [0.1, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn behind_camera_is_rejected() {
        let k = CameraIntrinsics::new(500.0, 500.0, 0.0, 0.0);
        let pose = Pose::from_rvec_tvec([0.0; 3], [0.0, 0.0, -1.0]);
        assert_eq!(
            project_board_point(&k, &DistortionCoeffs::default(), &pose, [0.0, 0.0]),
            None
        );
    }

    #[test]
    fn rvec_round_trip() {
        let pose = Pose::from_rvec_tvec([0.1, -0.2, 0.3], [1.0, 2.0, 3.0]);
        let r = pose.rvec();
        assert_relative_eq!(r[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[1], -0.2, epsilon = 1e-12);
        assert_relative_eq!(r[2], 0.3, epsilon = 1e-12);
        assert_eq!(pose.tvec(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn matrix_layout() {
        let k = CameraIntrinsics::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(k.to_array(), [[1.0, 0.0, 3.0], [0.0, 2.0, 4.0], [0.0, 0.0, 1.0]]);
        assert_eq!(CameraIntrinsics::from_matrix(&k.matrix()), k);
    }
}
