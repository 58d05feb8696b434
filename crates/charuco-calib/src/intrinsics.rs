//! Closed-form initialisation of the camera matrix from plane homographies.

use nalgebra::{DMatrix, Matrix2, Matrix3, Vector2};

use crate::{camera::CameraIntrinsics, error::CalibError, homography};

/// Minimum number of views for the full closed-form solution.
pub const MIN_VIEWS_CLOSED_FORM: usize = 3;

/// Maps pixels to a centred frame where the image spans roughly `[-0.5, 0.5]`.
fn image_normalization(width: usize, height: usize) -> Matrix3<f64> {
    let s = 1.0 / width.max(height) as f64;
    let cx = 0.5 * width as f64;
    let cy = 0.5 * height as f64;
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

/// Homographies in the normalised image frame, scaled to unit norm.
fn normalized_homographies(homographies: &[Matrix3<f64>], t: &Matrix3<f64>) -> Vec<Matrix3<f64>> {
    homographies
        .iter()
        .map(|h| {
            let hn = t * h;
            hn / hn.norm()
        })
        .collect()
}

// v_ij row of the constraint h_i^T B h_j, with b = [B11, B12, B22, B13, B23, B33]
fn v_row(h: &Matrix3<f64>, i: usize, j: usize) -> [f64; 6] {
    let (hi, hj) = (h.column(i), h.column(j));
    [
        hi[0] * hj[0],
        hi[0] * hj[1] + hi[1] * hj[0],
        hi[1] * hj[1],
        hi[2] * hj[0] + hi[0] * hj[2],
        hi[2] * hj[1] + hi[1] * hj[2],
        hi[2] * hj[2],
    ]
}

/// Zhang's method with zero skew, on normalised homographies.
fn closed_form(homographies: &[Matrix3<f64>]) -> Option<CameraIntrinsics> {
    let rows = 2 * homographies.len() + 1;
    let mut v = DMatrix::<f64>::zeros(rows.max(6), 6);

    for (k, h) in homographies.iter().enumerate() {
        let v12 = v_row(h, 0, 1);
        let v11 = v_row(h, 0, 0);
        let v22 = v_row(h, 1, 1);
        for c in 0..6 {
            v[(2 * k, c)] = v12[c];
            v[(2 * k + 1, c)] = v11[c] - v22[c];
        }
    }
    // zero skew: B12 = 0
    v[(2 * homographies.len(), 1)] = 1.0;

    let b = homography::smallest_right_singular_vector(v)?;
    let b = if b[0] < 0.0 { -b } else { b };
    let (b11, b12, b22, b13, b23, b33) = (b[0], b[1], b[2], b[3], b[4], b[5]);

    let den = b11 * b22 - b12 * b12;
    if b11 <= 0.0 || den <= 0.0 {
        return None;
    }

    let v0 = (b12 * b13 - b11 * b23) / den;
    let lambda = b33 - (b13 * b13 + v0 * (b12 * b13 - b11 * b23)) / b11;
    if lambda <= 0.0 {
        return None;
    }

    let alpha = (lambda / b11).sqrt();
    let beta = (lambda * b11 / den).sqrt();
    let u0 = -b13 * alpha * alpha / lambda;

    let k = CameraIntrinsics::new(alpha, beta, u0, v0);
    k.is_valid().then_some(k)
}

/// Focal lengths with the principal point fixed at the origin of the normalised frame.
fn fixed_principal_point(homographies: &[Matrix3<f64>]) -> Option<CameraIntrinsics> {
    // solve for a = 1/fx^2, b = 1/fy^2 in the least squares sense
    let mut ata = Matrix2::<f64>::zeros();
    let mut atb = Vector2::<f64>::zeros();

    for h in homographies {
        let (h1, h2) = (h.column(0), h.column(1));
        let rows = [
            (
                Vector2::new(h1[0] * h2[0], h1[1] * h2[1]),
                -h1[2] * h2[2],
            ),
            (
                Vector2::new(h1[0] * h1[0] - h2[0] * h2[0], h1[1] * h1[1] - h2[1] * h2[1]),
                -(h1[2] * h1[2] - h2[2] * h2[2]),
            ),
        ];
        for (a, rhs) in rows {
            ata += a * a.transpose();
            atb += a * rhs;
        }
    }

    let sol = ata.try_inverse()? * atb;
    if sol[0] <= 0.0 || sol[1] <= 0.0 {
        return None;
    }

    let k = CameraIntrinsics::new(1.0 / sol[0].sqrt(), 1.0 / sol[1].sqrt(), 0.0, 0.0);
    k.is_valid().then_some(k)
}

/// Initial camera matrix from board-to-image homographies.
///
/// Uses the closed-form solution with zero skew when at least
/// [`MIN_VIEWS_CLOSED_FORM`] views are given, otherwise or when that fails
/// estimates the focal lengths with the principal point at the image centre.
/// As a last resort the focal length is set to the larger image side.
///
/// # Arguments
///
/// * `homographies` - One homography per view mapping board to pixel coordinates.
/// * `width` - The image width in pixels.
/// * `height` - The image height in pixels.
pub fn initialize_intrinsics(
    homographies: &[Matrix3<f64>],
    width: usize,
    height: usize,
) -> Result<CameraIntrinsics, CalibError> {
    if width == 0 || height == 0 {
        return Err(CalibError::InvalidImageSize(width, height));
    }
    if homographies.is_empty() {
        return Err(CalibError::NoViews);
    }

    let t = image_normalization(width, height);
    let t_inv = t.try_inverse().ok_or(CalibError::DegenerateIntrinsics)?;
    let hs = normalized_homographies(homographies, &t);

    let normalized = if homographies.len() >= MIN_VIEWS_CLOSED_FORM {
        closed_form(&hs).or_else(|| {
            log::debug!("closed-form intrinsics failed, fixing the principal point");
            fixed_principal_point(&hs)
        })
    } else {
        fixed_principal_point(&hs)
    };

    let Some(k_n) = normalized else {
        let f = width.max(height) as f64;
        log::warn!("cannot initialise the focal length from the views, using {f}");
        return Ok(CameraIntrinsics::new(
            f,
            f,
            0.5 * width as f64,
            0.5 * height as f64,
        ));
    };

    let k = CameraIntrinsics::from_matrix(&(t_inv * k_n.matrix()));
    if !k.is_valid() {
        return Err(CalibError::DegenerateIntrinsics);
    }
    Ok(k)
}
