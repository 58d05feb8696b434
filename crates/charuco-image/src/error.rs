/// An error type for the image crate.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the source and destination images have different sizes.
    #[error("Image size mismatch: source {0}x{1}, destination {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel is requested outside the image.
    #[error("Pixel index ({0}, {1}) is out of bounds")]
    PixelIndexOutOfBounds(usize, usize),

    /// Error when a raw buffer does not hold the expected number of bytes.
    #[error("Buffer length ({0}) does not match the expected length ({1})")]
    InvalidBufferLength(usize, usize),

    /// Error when a transformation matrix cannot be inverted.
    #[error("Cannot compute the determinant of the transformation matrix")]
    CannotComputeDeterminant,
}
