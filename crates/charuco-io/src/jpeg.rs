use charuco_image::{Image, ImageSize};
use zune_jpeg::{errors::DecodeErrors, JpegDecoder};

use crate::error::IoError;

/// Decode a JPEG buffer (e.g. an MJPG camera frame) into an RGB8 image.
///
/// # Arguments
///
/// * `src` - The compressed JPEG bytes.
///
/// # Returns
///
/// The decoded image with three channels.
pub fn decode_image_jpeg_rgb8(src: &[u8]) -> Result<Image<u8, 3>, IoError> {
    let mut decoder = JpegDecoder::new(src);
    decoder.decode_headers()?;

    let image_info = decoder.info().ok_or_else(|| {
        IoError::JpegDecodingError(DecodeErrors::Format(String::from(
            "Failed to find image info from its metadata",
        )))
    })?;

    let image_size = ImageSize {
        width: image_info.width as usize,
        height: image_info.height as usize,
    };

    let img_data = decoder.decode()?;

    Ok(Image::new(image_size, img_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_garbage_fails() {
        let res = decode_image_jpeg_rgb8(&[0u8, 1, 2, 3]);
        assert!(matches!(res, Err(IoError::JpegDecodingError(_))));
    }
}
