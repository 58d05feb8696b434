use crate::Image;

/// Kernel for bilinear interpolation of an 8-bit image.
///
/// Pixel centres lie at integer coordinates. Coordinates outside the image are
/// clamped to the border pixels.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `ch` - The channel to interpolate.
///
/// # Returns
///
/// The interpolated intensity as a float in `[0, 255]`.
///
/// # Example
///
/// ```
/// use charuco_image::Image;
/// use charuco_image::interpolation::bilinear_u8;
///
/// let image = Image::<u8, 1>::new([2, 1].into(), vec![0, 100]).unwrap();
/// assert_eq!(bilinear_u8(&image, 0.5, 0.0, 0), 50.0);
/// ```
pub fn bilinear_u8<const C: usize>(image: &Image<u8, C>, u: f64, v: f64, ch: usize) -> f64 {
    let (rows, cols) = (image.rows(), image.cols());
    if rows == 0 || cols == 0 {
        return 0.0;
    }

    let u = u.clamp(0.0, (cols - 1) as f64);
    let v = v.clamp(0.0, (rows - 1) as f64);

    let iu0 = u.floor() as usize;
    let iv0 = v.floor() as usize;
    let iu1 = (iu0 + 1).min(cols - 1);
    let iv1 = (iv0 + 1).min(rows - 1);

    let frac_u = u - iu0 as f64;
    let frac_v = v - iv0 as f64;

    let data = image.as_slice();
    let at = |iu: usize, iv: usize| data[(iv * cols + iu) * C + ch] as f64;

    let top = at(iu0, iv0) * (1.0 - frac_u) + at(iu1, iv0) * frac_u;
    let bottom = at(iu0, iv1) * (1.0 - frac_u) + at(iu1, iv1) * frac_u;

    top * (1.0 - frac_v) + bottom * frac_v
}

/// Image gradient at a sub-pixel location using central differences of bilinear samples.
///
/// Returns `(dI/dx, dI/dy)`.
pub fn gradient_u8(image: &Image<u8, 1>, u: f64, v: f64) -> (f64, f64) {
    let gx = 0.5 * (bilinear_u8(image, u + 1.0, v, 0) - bilinear_u8(image, u - 1.0, v, 0));
    let gy = 0.5 * (bilinear_u8(image, u, v + 1.0, 0) - bilinear_u8(image, u, v - 1.0, 0));
    (gx, gy)
}

#[cfg(test)]
mod tests {
    use crate::{Image, ImageError};
    use approx::assert_relative_eq;

    #[test]
    fn bilinear_corners_and_center() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([2, 2].into(), vec![0, 100, 100, 200])?;
        assert_eq!(super::bilinear_u8(&image, 0.0, 0.0, 0), 0.0);
        assert_eq!(super::bilinear_u8(&image, 1.0, 1.0, 0), 200.0);
        assert_relative_eq!(super::bilinear_u8(&image, 0.5, 0.5, 0), 100.0);
        Ok(())
    }

    #[test]
    fn bilinear_clamps_outside() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([2, 1].into(), vec![10, 20])?;
        assert_eq!(super::bilinear_u8(&image, -3.0, 0.0, 0), 10.0);
        assert_eq!(super::bilinear_u8(&image, 5.0, 7.0, 0), 20.0);
        Ok(())
    }

    #[test]
    fn bilinear_channel() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new([2, 1].into(), vec![0, 10, 20, 100, 110, 120])?;
        assert_relative_eq!(super::bilinear_u8(&image, 0.5, 0.0, 2), 70.0);
        Ok(())
    }

    #[test]
    fn gradient_ramp() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([4, 1].into(), vec![0, 10, 20, 30])?;
        let (gx, gy) = super::gradient_u8(&image, 1.5, 0.0);
        assert_relative_eq!(gx, 10.0);
        assert_relative_eq!(gy, 0.0);
        Ok(())
    }
}
