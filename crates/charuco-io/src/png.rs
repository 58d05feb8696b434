use std::{fs, fs::File, io::BufWriter, path::Path};

use charuco_image::{
    color::{gray_from_rgb_u8, gray_from_rgba_u8, rgb_from_gray_u8},
    Image, ImageSize,
};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};

use crate::error::IoError;

/// Read a PNG image and convert it to a single channel (mono8).
///
/// Palette, low bit depth and 16-bit files are normalised to 8 bits first;
/// colour files are converted to intensity.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A grayscale image with a single channel (mono8).
pub fn read_image_png_mono8(file_path: impl AsRef<Path>) -> Result<Image<u8, 1>, IoError> {
    let (buf, size, color_type) = read_png_impl(file_path)?;
    match color_type {
        ColorType::Grayscale => Ok(Image::new(size, buf)?),
        ColorType::GrayscaleAlpha => {
            let gray = buf.chunks_exact(2).map(|p| p[0]).collect();
            Ok(Image::new(size, gray)?)
        }
        ColorType::Rgb => {
            let rgb = Image::<u8, 3>::new(size, buf)?;
            let mut gray = Image::from_size_val(size, 0u8);
            gray_from_rgb_u8(&rgb, &mut gray)?;
            Ok(gray)
        }
        ColorType::Rgba => {
            let rgba = Image::<u8, 4>::new(size, buf)?;
            let mut gray = Image::from_size_val(size, 0u8);
            gray_from_rgba_u8(&rgba, &mut gray)?;
            Ok(gray)
        }
        ColorType::Indexed => Err(IoError::PngDecodeError(
            "indexed png was not expanded".to_string(),
        )),
    }
}

/// Read a PNG image and convert it to three channels (rgb8).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A RGB image with three channels (rgb8).
pub fn read_image_png_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let (buf, size, color_type) = read_png_impl(file_path)?;
    match color_type {
        ColorType::Rgb => Ok(Image::new(size, buf)?),
        ColorType::Rgba => {
            let rgb = buf
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect();
            Ok(Image::new(size, rgb)?)
        }
        ColorType::Grayscale | ColorType::GrayscaleAlpha => {
            let step = if color_type == ColorType::Grayscale { 1 } else { 2 };
            let gray = Image::<u8, 1>::new(size, buf.iter().step_by(step).copied().collect())?;
            let mut rgb = Image::from_size_val(size, 0u8);
            rgb_from_gray_u8(&gray, &mut rgb)?;
            Ok(rgb)
        }
        ColorType::Indexed => Err(IoError::PngDecodeError(
            "indexed png was not expanded".to_string(),
        )),
    }
}

// utility function to read the png file normalised to 8 bits per channel
fn read_png_impl(file_path: impl AsRef<Path>) -> Result<(Vec<u8>, ImageSize, ColorType), IoError> {
    // verify the file exists
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    // verify the file extension
    if file_path
        .extension()
        .map_or(true, |ext| !ext.eq_ignore_ascii_case("png"))
    {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }

    let file = fs::File::open(file_path)?;
    let mut decoder = Decoder::new(file);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let size = ImageSize {
        width: info.width as usize,
        height: info.height as usize,
    };

    Ok((buf, size, info.color_type))
}

/// Writes the given PNG _(rgb8)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - The image to encode.
pub fn write_image_png_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
) -> Result<(), IoError> {
    write_png_impl(file_path, image.as_slice(), image.size(), ColorType::Rgb)
}

/// Writes the given PNG _(grayscale 8-bit)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - The image to encode.
pub fn write_image_png_gray8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 1>,
) -> Result<(), IoError> {
    write_png_impl(
        file_path,
        image.as_slice(),
        image.size(),
        ColorType::Grayscale,
    )
}

fn write_png_impl(
    file_path: impl AsRef<Path>,
    image_data: &[u8],
    image_size: ImageSize,
    color_type: ColorType,
) -> Result<(), IoError> {
    let file = File::create(file_path)?;

    let mut encoder = Encoder::new(
        BufWriter::new(file),
        image_size.width as u32,
        image_size.height as u32,
    );
    encoder.set_color(color_type);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(image_data)
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    Ok(())
}
