use crate::{interpolation::bilinear_u8, Image, ImageError};

#[rustfmt::skip]
fn determinant3x3(m: &[f64; 9]) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[rustfmt::skip]
fn adjugate3x3(m: &[f64; 9]) -> [f64; 9] {
    [
        m[4] * m[8] - m[5] * m[7],
        m[2] * m[7] - m[1] * m[8],
        m[1] * m[5] - m[2] * m[4],
        m[5] * m[6] - m[3] * m[8],
        m[0] * m[8] - m[2] * m[6],
        m[2] * m[3] - m[0] * m[5],
        m[3] * m[7] - m[4] * m[6],
        m[1] * m[6] - m[0] * m[7],
        m[0] * m[4] - m[1] * m[3],
    ]
}

/// Invert a row-major 3x3 perspective matrix.
pub fn inverse_perspective_matrix(m: &[f64; 9]) -> Result<[f64; 9], ImageError> {
    let det = determinant3x3(m);

    if det.abs() < f64::EPSILON {
        return Err(ImageError::CannotComputeDeterminant);
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for i in 0..9 {
        inv_m[i] = adj[i] * inv_det;
    }

    Ok(inv_m)
}

/// Apply a row-major 3x3 perspective matrix to a point.
#[inline]
pub fn transform_point(x: f64, y: f64, m: &[f64; 9]) -> (f64, f64) {
    let w = m[6] * x + m[7] * y + m[8];
    let xt = (m[0] * x + m[1] * y + m[2]) / w;
    let yt = (m[3] * x + m[4] * y + m[5]) / w;
    (xt, yt)
}

/// Applies a perspective transformation to an 8-bit image.
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (height, width, channels).
/// * `m` - The 3x3 perspective transformation matrix src -> dst, row-major.
/// * `fill` - Value written to destination pixels that map outside the source.
///
/// Sampling is bilinear.
///
/// # Example
///
/// ```
/// use charuco_image::Image;
/// use charuco_image::warp::warp_perspective_u8;
///
/// let src = Image::<u8, 1>::new([2, 1].into(), vec![10, 20]).unwrap();
/// let mut dst = Image::<u8, 1>::from_size_val([2, 1].into(), 0);
///
/// // horizontal flip
/// let m = [-1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
/// warp_perspective_u8(&src, &mut dst, &m, 255).unwrap();
/// assert_eq!(dst.as_slice(), &[20, 10]);
/// ```
pub fn warp_perspective_u8<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    m: &[f64; 9],
    fill: u8,
) -> Result<(), ImageError> {
    let inv_m = inverse_perspective_matrix(m)?;

    let (src_cols, src_rows) = (src.cols() as f64, src.rows() as f64);
    let dst_cols = dst.cols();

    dst.as_slice_mut()
        .chunks_exact_mut(C)
        .enumerate()
        .for_each(|(idx, dst_pixel)| {
            let (x, y) = ((idx % dst_cols) as f64, (idx / dst_cols) as f64);
            let (xs, ys) = transform_point(x, y, &inv_m);
            let inside = xs.is_finite()
                && ys.is_finite()
                && xs >= -0.5
                && xs < src_cols - 0.5
                && ys >= -0.5
                && ys < src_rows - 0.5;
            for (k, pixel) in dst_pixel.iter_mut().enumerate() {
                *pixel = if inside {
                    bilinear_u8(src, xs, ys, k).round() as u8
                } else {
                    fill
                };
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Image, ImageError, ImageSize};

    #[test]
    fn inverse_perspective_matrix() -> Result<(), ImageError> {
        let m = [1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
        let expected = [1.0, 0.0, 1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0];
        let inv_m = super::inverse_perspective_matrix(&m)?;
        assert_eq!(inv_m, expected);
        Ok(())
    }

    #[test]
    fn singular_matrix() {
        let m = [1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0];
        assert_eq!(
            super::inverse_perspective_matrix(&m),
            Err(ImageError::CannotComputeDeterminant)
        );
    }

    #[test]
    fn transform_point() {
        let m = [1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
        let (x, y) = super::transform_point(1.0, 1.0, &m);
        assert_eq!((x, y), (0.0, 2.0));
    }

    #[test]
    fn warp_perspective_translation_fills_outside() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            vec![1, 2, 3, 4, 5, 6],
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(image.size(), 0);

        // shift right by one pixel
        let m = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        super::warp_perspective_u8(&image, &mut dst, &m, 255)?;

        assert_eq!(dst.as_slice(), &[255, 1, 2, 255, 4, 5]);
        Ok(())
    }

    #[test]
    fn warp_perspective_identity_rgb() -> Result<(), ImageError> {
        let data: Vec<u8> = (0..24).collect();
        let image = Image::<u8, 3>::new([4, 2].into(), data)?;
        let mut dst = Image::<u8, 3>::from_size_val(image.size(), 0);
        let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        super::warp_perspective_u8(&image, &mut dst, &m, 0)?;
        assert_eq!(dst.as_slice(), image.as_slice());
        Ok(())
    }
}
