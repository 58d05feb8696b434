use crate::{Image, ImageError};

/// Convert an RGB8 image to grayscale using the formula:
///
/// Y = (77 * R + 150 * G + 29 * B) >> 8
///
/// # Arguments
///
/// * `src` - The input RGB8 image.
/// * `dst` - The output grayscale image.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use charuco_image::{Image, ImageSize};
/// use charuco_image::color::gray_from_rgb_u8;
///
/// let rgb = Image::<u8, 3>::new(ImageSize { width: 1, height: 1 }, vec![255, 255, 255]).unwrap();
/// let mut gray = Image::<u8, 1>::from_size_val(rgb.size(), 0);
///
/// gray_from_rgb_u8(&rgb, &mut gray).unwrap();
/// assert_eq!(gray.as_slice(), &[255]);
/// ```
pub fn gray_from_rgb_u8(src: &Image<u8, 3>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    src.as_slice()
        .chunks_exact(3)
        .zip(dst.as_slice_mut().iter_mut())
        .for_each(|(src_pixel, dst_pixel)| {
            let r = src_pixel[0] as u16;
            let g = src_pixel[1] as u16;
            let b = src_pixel[2] as u16;
            // 77 + 150 + 29 = 256, so the sum never exceeds 255 * 256
            *dst_pixel = ((r * 77 + g * 150 + b * 29) >> 8) as u8;
        });

    Ok(())
}

/// Convert an RGBA8 image to grayscale, ignoring the alpha channel.
pub fn gray_from_rgba_u8(src: &Image<u8, 4>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    src.as_slice()
        .chunks_exact(4)
        .zip(dst.as_slice_mut().iter_mut())
        .for_each(|(src_pixel, dst_pixel)| {
            let r = src_pixel[0] as u16;
            let g = src_pixel[1] as u16;
            let b = src_pixel[2] as u16;
            *dst_pixel = ((r * 77 + g * 150 + b * 29) >> 8) as u8;
        });

    Ok(())
}

/// Convert a grayscale image to an RGB image by replicating the grayscale value across all three channels.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output RGB image.
///
/// Precondition: the input and output images must have the same size.
pub fn rgb_from_gray_u8(src: &Image<u8, 1>, dst: &mut Image<u8, 3>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    src.as_slice()
        .iter()
        .zip(dst.as_slice_mut().chunks_exact_mut(3))
        .for_each(|(&v, dst_pixel)| {
            dst_pixel.fill(v);
        });

    Ok(())
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Convert a packed YUYV (YUV 4:2:2) buffer to an RGB8 image.
///
/// Each group of 4 bytes `Y0 U Y1 V` encodes two horizontally adjacent pixels
/// sharing the same chroma. Uses the full range BT.601 coefficients in fixed point.
///
/// # Arguments
///
/// * `src` - The packed YUYV buffer with `width * height * 2` bytes.
/// * `dst` - The output RGB image. Its width must be even.
pub fn convert_yuyv_to_rgb_u8(src: &[u8], dst: &mut Image<u8, 3>) -> Result<(), ImageError> {
    let expected = dst.width() * dst.height() * 2;
    if src.len() != expected {
        return Err(ImageError::InvalidBufferLength(src.len(), expected));
    }

    src.chunks_exact(4)
        .zip(dst.as_slice_mut().chunks_exact_mut(6))
        .for_each(|(yuyv, rgb)| {
            let u = yuyv[1] as i32 - 128;
            let v = yuyv[3] as i32 - 128;

            // R = Y + 1.402 V, G = Y - 0.344 U - 0.714 V, B = Y + 1.772 U (scaled by 256)
            let dr = (359 * v) >> 8;
            let dg = (88 * u + 183 * v) >> 8;
            let db = (454 * u) >> 8;

            for (k, &y) in [yuyv[0], yuyv[2]].iter().enumerate() {
                let y = y as i32;
                rgb[3 * k] = clamp_u8(y + dr);
                rgb[3 * k + 1] = clamp_u8(y - dg);
                rgb[3 * k + 2] = clamp_u8(y + db);
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Image, ImageError, ImageSize};

    #[test]
    fn gray_from_rgb_u8() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![0, 128, 255, 128, 0, 128],
        )?;

        let mut gray = Image::<u8, 1>::from_size_val(image.size(), 0);
        super::gray_from_rgb_u8(&image, &mut gray)?;

        assert_eq!(gray.as_slice(), &[103, 53]);
        Ok(())
    }

    #[test]
    fn gray_from_rgb_u8_size_mismatch() {
        let image = Image::<u8, 3>::from_size_val([2, 2].into(), 0);
        let mut gray = Image::<u8, 1>::from_size_val([3, 2].into(), 0);
        assert_eq!(
            super::gray_from_rgb_u8(&image, &mut gray),
            Err(ImageError::InvalidImageSize(2, 2, 3, 2))
        );
    }

    #[test]
    fn gray_rgb_gray_identity() -> Result<(), ImageError> {
        let gray = Image::<u8, 1>::new([3, 1].into(), vec![0, 77, 255])?;
        let mut rgb = Image::<u8, 3>::from_size_val(gray.size(), 0);
        super::rgb_from_gray_u8(&gray, &mut rgb)?;
        assert_eq!(rgb.as_slice(), &[0, 0, 0, 77, 77, 77, 255, 255, 255]);

        let mut back = Image::<u8, 1>::from_size_val(gray.size(), 0);
        super::gray_from_rgb_u8(&rgb, &mut back)?;
        assert_eq!(back.as_slice(), gray.as_slice());
        Ok(())
    }

    #[test]
    fn yuyv_neutral_chroma_is_gray() -> Result<(), ImageError> {
        let yuyv = vec![16u8, 128, 200, 128];
        let mut rgb = Image::<u8, 3>::from_size_val([2, 1].into(), 0);
        super::convert_yuyv_to_rgb_u8(&yuyv, &mut rgb)?;
        assert_eq!(rgb.as_slice(), &[16, 16, 16, 200, 200, 200]);
        Ok(())
    }

    #[test]
    fn yuyv_invalid_length() {
        let mut rgb = Image::<u8, 3>::from_size_val([2, 2].into(), 0);
        assert_eq!(
            super::convert_yuyv_to_rgb_u8(&[0u8; 6], &mut rgb),
            Err(ImageError::InvalidBufferLength(6, 8))
        );
    }
}
