#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image representation for computer vision purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

/// Color space conversions between the frame formats produced by cameras and files.
pub mod color;

/// Sub-pixel sampling of image intensities.
pub mod interpolation;

/// Geometric warps of images.
pub mod warp;

pub use crate::error::ImageError;
pub use crate::image::{GrayImage, Image, ImageSize, RgbImage};
