use nalgebra::{DMatrix, Matrix3, Vector3};

use crate::error::CalibError;

/// Similarity transform moving the centroid to the origin with mean distance sqrt(2).
fn normalize_points(points: &[[f64; 2]]) -> Option<(Vec<[f64; 2]>, Matrix3<f64>)> {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (mx, my) = (sx / n, sy / n);

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - mx).powi(2) + (p[1] - my).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist.is_nan() || mean_dist <= f64::EPSILON {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let normalized = points
        .iter()
        .map(|p| [s * (p[0] - mx), s * (p[1] - my)])
        .collect();

    #[rustfmt::skip]
    let t = Matrix3::new(
        s, 0.0, -s * mx,
        0.0, s, -s * my,
        0.0, 0.0, 1.0,
    );

    Some((normalized, t))
}

/// Estimate `H` such that `dst ~ H src` with the normalised direct linear transform.
///
/// # Arguments
///
/// * `src` - Source points, at least 4.
/// * `dst` - Destination points, same length as `src`.
///
/// # Returns
///
/// The homography scaled so that `H[2,2] == 1`.
pub fn find_homography_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Matrix3<f64>, CalibError> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return Err(CalibError::DegenerateHomography);
    }

    let (src_n, t_src) = normalize_points(src).ok_or(CalibError::DegenerateHomography)?;
    let (dst_n, t_dst) = normalize_points(dst).ok_or(CalibError::DegenerateHomography)?;

    // pad to a square system when only 4 points are given
    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);

    for (i, (ps, pd)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (x, y) = (ps[0], ps[1]);
        let (u, v) = (pd[0], pd[1]);

        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let h = smallest_right_singular_vector(a).ok_or(CalibError::DegenerateHomography)?;

    let h_n = Matrix3::from_row_slice(h.as_slice());
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(CalibError::DegenerateHomography)?;
    let h_mat = t_dst_inv * h_n * t_src;

    let scale = h_mat[(2, 2)];
    if !scale.is_finite() || scale.abs() < 1e-12 {
        return Err(CalibError::DegenerateHomography);
    }
    let h_mat = h_mat / scale;

    if h_mat.determinant().abs() < 1e-12 || h_mat.iter().any(|v| !v.is_finite()) {
        return Err(CalibError::DegenerateHomography);
    }

    Ok(h_mat)
}

/// The right singular vector of the smallest singular value of `a`.
pub(crate) fn smallest_right_singular_vector(a: DMatrix<f64>) -> Option<nalgebra::DVector<f64>> {
    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let (idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    Some(v_t.row(idx).transpose())
}

/// Apply a homography to a 2d point.
#[inline]
pub fn project_homography(h: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    let q = h * Vector3::new(p[0], p[1], 1.0);
    [q.x / q.z, q.y / q.z]
}

/// Row-major copy of a 3x3 matrix.
pub fn to_row_major(h: &Matrix3<f64>) -> [f64; 9] {
    [
        h[(0, 0)],
        h[(0, 1)],
        h[(0, 2)],
        h[(1, 0)],
        h[(1, 1)],
        h[(1, 2)],
        h[(2, 0)],
        h[(2, 1)],
        h[(2, 2)],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn homography_identity() -> Result<(), CalibError> {
        let x1 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let h = find_homography_dlt(&x1, &x1)?;
        assert_relative_eq!(h, Matrix3::identity(), epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn homography_perspective() -> Result<(), CalibError> {
        #[rustfmt::skip]
        let expected = Matrix3::new(
            1.2, 0.1, 30.0,
            -0.05, 0.9, 12.0,
            1e-4, -2e-4, 1.0,
        );
        let src: Vec<[f64; 2]> = (0..5)
            .flat_map(|r| (0..4).map(move |c| [c as f64 * 25.0, r as f64 * 25.0]))
            .collect();
        let dst: Vec<[f64; 2]> = src
            .iter()
            .map(|&p| project_homography(&expected, p))
            .collect();

        let h = find_homography_dlt(&src, &dst)?;
        assert_relative_eq!(h, expected, epsilon = 1e-6);

        let corners = [0, 3, 16, 19];
        let src4: Vec<[f64; 2]> = corners.iter().map(|&i| src[i]).collect();
        let dst4: Vec<[f64; 2]> = corners.iter().map(|&i| dst[i]).collect();
        let four = find_homography_dlt(&src4, &dst4)?;
        assert_relative_eq!(four, expected, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn homography_degenerate() {
        let same = [[2.0, 3.0]; 4];
        assert_eq!(
            find_homography_dlt(&same, &same),
            Err(CalibError::DegenerateHomography)
        );

        let three = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            find_homography_dlt(&three, &three),
            Err(CalibError::DegenerateHomography)
        );
    }

    #[test]
    fn row_major_layout() {
        let h = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(to_row_major(&h), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }
}
