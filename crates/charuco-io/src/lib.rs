#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the io module.
pub mod error;

/// PNG image encoding and decoding.
pub mod png;

/// NumPy `.npy` persistence of calibration matrices.
pub mod npy;

/// Enumeration of the calibration image directory.
pub mod image_set;

/// JPEG decoding of compressed camera frames.
pub mod jpeg;

/// Video4Linux2 camera capture.
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub mod v4l;

pub use crate::error::IoError;
pub use crate::image_set::{ImageSet, ImageSetEntry};
