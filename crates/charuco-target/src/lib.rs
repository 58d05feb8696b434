#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for boards and detection.
pub mod errors;

/// Predefined square marker dictionaries.
pub mod dictionary;

/// ChArUco board geometry.
pub mod board;

/// Rendering of printable boards.
pub mod render;

/// Integral images and adaptive thresholding.
pub mod threshold;

/// Union-find over pixel indices.
pub mod union_find;

/// Connected components of binary images.
pub mod segmentation;

/// Quadrilateral fitting of dark components.
pub mod quad;

/// Reading marker bits inside a quad.
pub mod decode;

/// Marker detection.
pub mod detector;

/// Sub-pixel refinement of saddle corners.
pub mod subpix;

/// Chessboard corner interpolation from detected markers.
pub mod charuco;

pub use crate::board::{BoardSpec, CharucoBoard};
pub use crate::charuco::{interpolate_corners, CharucoCorners, CharucoParams};
pub use crate::detector::{detect_markers, DetectorParams, Marker, MarkerDetector};
pub use crate::dictionary::{Dictionary, DictionaryData, DictionaryKind};
pub use crate::errors::TargetError;
pub use crate::render::{render_board, RenderLayout};
