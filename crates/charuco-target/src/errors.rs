/// Errors that can occur when building boards or detecting markers.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TargetError {
    /// Error related to image.
    #[error(transparent)]
    ImageError(#[from] charuco_image::ImageError),

    /// The dictionary name is not one of the predefined dictionaries.
    #[error("Unknown marker dictionary: {0}")]
    UnknownDictionary(String),

    /// A loaded dictionary table is malformed.
    #[error("Invalid marker dictionary: {0}")]
    InvalidDictionary(String),

    /// A marker id beyond the size of the dictionary was requested.
    #[error("Marker id {0} is out of range for a dictionary of {1} markers")]
    MarkerIdOutOfRange(u32, usize),

    /// The board needs at least two squares along each axis.
    #[error("Board must have at least 2x2 squares, got {0}x{1}")]
    InvalidBoardShape(usize, usize),

    /// Square and marker lengths must be positive with the marker inside the square.
    #[error("Marker length ({1}) must be positive and smaller than the square length ({0})")]
    InvalidMarkerLength(f64, f64),

    /// The dictionary holds fewer markers than the board needs.
    #[error("Board needs {0} markers but the dictionary only has {1}")]
    DictionaryTooSmall(usize, usize),

    /// The requested render size cannot hold the board.
    #[error("Render size {0}x{1} with margin {2} leaves no room for the board")]
    InvalidRenderSize(usize, usize, usize),

    /// Marker and id lists are not consistent.
    #[error("Marker detections and ids do not match")]
    MarkerMismatch,
}
