use charuco_image::{GrayImage, ImageError};

use crate::errors::TargetError;

/// Summed-area table of an 8-bit image.
///
/// Entry `(x, y)` holds the sum of all pixels above and to the left of `(x, y)`,
/// so the table has one more row and column than the image.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    width: usize,
    height: usize,
    data: Vec<u64>,
}

impl IntegralImage {
    /// Build the table of `src`.
    pub fn new(src: &GrayImage) -> Self {
        let (width, height) = (src.width(), src.height());
        let stride = width + 1;
        let mut data = vec![0u64; stride * (height + 1)];

        for (y, row) in src.rows_iter().enumerate() {
            let mut row_sum = 0u64;
            for (x, &px) in row.iter().enumerate() {
                row_sum += px as u64;
                data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row_sum;
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    /// Sum of the pixels in `[x0, x1) x [y0, y1)`.
    #[inline]
    pub fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let stride = self.width + 1;
        self.data[y1 * stride + x1] + self.data[y0 * stride + x0]
            - self.data[y0 * stride + x1]
            - self.data[y1 * stride + x0]
    }

    /// Width of the source image.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the source image.
    pub fn height(&self) -> usize {
        self.height
    }
}

/// Mark the pixels darker than their local mean.
///
/// A pixel is set to 255 when its value is below the mean of the
/// `window x window` neighbourhood minus `constant`, and to 0 otherwise. The
/// neighbourhood is clipped at the image border.
///
/// # Arguments
///
/// * `src` - The grayscale image.
/// * `integral` - The integral image of `src`.
/// * `dst` - The binary output, same size as `src`.
/// * `window` - Side of the neighbourhood, odd values are centred.
/// * `constant` - Offset subtracted from the mean.
pub fn adaptive_threshold_mean(
    src: &GrayImage,
    integral: &IntegralImage,
    dst: &mut GrayImage,
    window: usize,
    constant: f64,
) -> Result<(), TargetError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(src.cols(), src.rows(), dst.cols(), dst.rows()).into());
    }
    if integral.width() != src.width() || integral.height() != src.height() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            integral.width(),
            integral.height(),
        )
        .into());
    }

    let (width, height) = (src.width(), src.height());
    let half = window / 2;
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .chunks_exact_mut(width)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let y0 = y.saturating_sub(half);
            let y1 = (y + half + 1).min(height);
            for (x, out) in dst_row.iter_mut().enumerate() {
                let x0 = x.saturating_sub(half);
                let x1 = (x + half + 1).min(width);
                let count = ((x1 - x0) * (y1 - y0)) as f64;
                let sum = integral.sum(x0, y0, x1, y1) as f64;
                let value = src_data[y * width + x] as f64;
                *out = if value * count < sum - constant * count {
                    255
                } else {
                    0
                };
            }
        });

    Ok(())
}
