use std::path::PathBuf;

/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(PathBuf),

    /// Invalid file extension.
    #[error("File does not have a valid extension: {0}")]
    InvalidFileExtension(PathBuf),

    /// Error to open, read or write the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] charuco_image::ImageError),

    /// Error to encode the PNG image.
    #[error("Failed to encode the png image. {0}")]
    PngEncodingError(String),

    /// Error to decode the PNG image.
    #[error("Failed to decode the png image. {0}")]
    PngDecodeError(String),

    /// Error to decode a JPEG frame.
    #[error("Error with Jpeg decoding. {0}")]
    JpegDecodingError(#[from] zune_jpeg::errors::DecodeErrors),

    /// Error to write a `.npy` file.
    #[error("Failed to write npy file. {0}")]
    NpyWriteError(#[from] ndarray_npy::WriteNpyError),

    /// Error to read a `.npy` file.
    #[error("Failed to read npy file. {0}")]
    NpyReadError(#[from] ndarray_npy::ReadNpyError),

    /// Error when a matrix does not have the expected shape.
    #[error("Matrix shape mismatch: expected {0:?}, got {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// A PNG file in the image directory does not follow the naming convention.
    #[error("Unexpected file name in image set: {0}")]
    MalformedImageName(PathBuf),

    /// Two files in the image directory map to the same sequence index.
    #[error("Duplicate image index {0}: {1}")]
    DuplicateImageIndex(usize, PathBuf),

    /// Error from the camera device.
    #[error("Camera error. {0}")]
    CameraError(String),

    /// The camera delivers a pixel format that cannot be converted.
    #[error("Unsupported camera pixel format: {0}")]
    UnsupportedPixelFormat(String),
}
