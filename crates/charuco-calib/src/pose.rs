use nalgebra::{Matrix3, Rotation3};

use crate::{
    camera::{CameraIntrinsics, Pose},
    error::CalibError,
};

/// Recover the board pose from a board-to-image homography.
///
/// The rotation is projected onto SO(3) and the board is placed in front of
/// the camera.
pub fn pose_from_homography(
    intrinsics: &CameraIntrinsics,
    h: &Matrix3<f64>,
) -> Result<Pose, CalibError> {
    let k_inv = intrinsics
        .matrix()
        .try_inverse()
        .ok_or(CalibError::DegenerateIntrinsics)?;
    let m = k_inv * h;

    let n1 = m.column(0).norm();
    let n2 = m.column(1).norm();
    if n1 <= f64::EPSILON || n2 <= f64::EPSILON {
        return Err(CalibError::DegenerateHomography);
    }
    let lambda = 2.0 / (n1 + n2);

    let mut r1 = m.column(0) * lambda;
    let mut r2 = m.column(1) * lambda;
    let mut t = m.column(2) * lambda;

    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }
    let r3 = r1.cross(&r2);

    let mut r = Matrix3::zeros();
    r.set_column(0, &r1);
    r.set_column(1, &r2);
    r.set_column(2, &r3);

    // closest rotation in the Frobenius sense
    let svd = r.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(CalibError::DegenerateHomography);
    };
    let mut rot = u * v_t;
    if rot.determinant() < 0.0 {
        let mut u = u;
        u.column_mut(2).neg_mut();
        rot = u * v_t;
    }

    if rot.iter().chain(t.iter()).any(|v| !v.is_finite()) {
        return Err(CalibError::NonFinite);
    }

    Ok(Pose {
        rotation: Rotation3::from_matrix_unchecked(rot),
        translation: t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pose_is_recovered() -> Result<(), CalibError> {
        let k = CameraIntrinsics::new(800.0, 800.0, 320.0, 240.0);
        let pose = Pose::from_rvec_tvec([0.2, -0.3, 0.1], [-40.0, 10.0, 500.0]);

        let r = pose.rotation.matrix();
        let mut m = Matrix3::zeros();
        m.set_column(0, &r.column(0));
        m.set_column(1, &r.column(1));
        m.set_column(2, &pose.translation);
        // arbitrary negative scale
        let h = k.matrix() * m * -0.01;

        let est = pose_from_homography(&k, &h)?;
        assert_relative_eq!(est.rotation.matrix(), r, epsilon = 1e-9);
        assert_relative_eq!(est.translation, pose.translation, epsilon = 1e-6);
        Ok(())
    }
}
