use charuco_image::{GrayImage, Image, ImageSize};

use crate::{board::CharucoBoard, errors::TargetError};

/// Placement of the board inside a rendered image.
///
/// The board keeps its aspect ratio, is scaled to the largest size fitting
/// inside the margins and is centred. Pixel centres lie at integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderLayout {
    /// Pixels per board unit.
    pub scale: f64,
    /// Left edge of the board in pixels.
    pub offset_x: f64,
    /// Top edge of the board in pixels.
    pub offset_y: f64,
}

impl RenderLayout {
    /// Compute the layout of `board` in an image of `size` with `margin` pixels on each side.
    pub fn new(board: &CharucoBoard, size: ImageSize, margin: usize) -> Result<Self, TargetError> {
        let spec = board.spec();
        if size.width <= 2 * margin || size.height <= 2 * margin {
            return Err(TargetError::InvalidRenderSize(
                size.width,
                size.height,
                margin,
            ));
        }

        let avail_w = (size.width - 2 * margin) as f64;
        let avail_h = (size.height - 2 * margin) as f64;
        let board_w = spec.columns as f64 * spec.square_length;
        let board_h = spec.rows as f64 * spec.square_length;

        let scale = (avail_w / board_w).min(avail_h / board_h);

        Ok(Self {
            scale,
            offset_x: margin as f64 + 0.5 * (avail_w - board_w * scale),
            offset_y: margin as f64 + 0.5 * (avail_h - board_h * scale),
        })
    }

    /// Pixel coordinates of a board point.
    #[inline]
    pub fn board_to_pixel(&self, bx: f64, by: f64) -> [f64; 2] {
        [
            self.offset_x + bx * self.scale - 0.5,
            self.offset_y + by * self.scale - 0.5,
        ]
    }

    /// Board coordinates of a pixel centre.
    #[inline]
    pub fn pixel_to_board(&self, x: usize, y: usize) -> [f64; 2] {
        [
            (x as f64 + 0.5 - self.offset_x) / self.scale,
            (y as f64 + 0.5 - self.offset_y) / self.scale,
        ]
    }
}

/// Render a printable image of the board.
///
/// # Arguments
///
/// * `board` - The board to draw.
/// * `size` - The exact output size.
/// * `margin` - Minimum white margin in pixels around the board.
/// * `border_bits` - Width of the black marker border, in marker cells.
///
/// # Returns
///
/// A grayscale image with black (0) and white (255) pixels.
pub fn render_board(
    board: &CharucoBoard,
    size: ImageSize,
    margin: usize,
    border_bits: usize,
) -> Result<GrayImage, TargetError> {
    let layout = RenderLayout::new(board, size, margin)?;
    let spec = board.spec();

    let marker_bits = (0..board.num_markers() as u32)
        .map(|id| board.dictionary().bits(id))
        .collect::<Result<Vec<_>, _>>()?;

    let n = board.dictionary().marker_size();
    let cells = n + 2 * border_bits;
    let cell_length = spec.marker_length / cells as f64;
    let marker_inset = 0.5 * (spec.square_length - spec.marker_length);

    let board_w = spec.columns as f64 * spec.square_length;
    let board_h = spec.rows as f64 * spec.square_length;

    let mut image = Image::from_size_val(size, 255u8);
    let width = size.width;

    image
        .as_slice_mut()
        .iter_mut()
        .enumerate()
        .for_each(|(idx, pixel)| {
            let [bx, by] = layout.pixel_to_board(idx % width, idx / width);
            if bx < 0.0 || by < 0.0 || bx >= board_w || by >= board_h {
                return;
            }

            let col = (bx / spec.square_length) as usize;
            let row = (by / spec.square_length) as usize;

            if board.is_black_square(row, col) {
                *pixel = 0;
                return;
            }

            let Some(id) = board.marker_at(row, col) else {
                return;
            };

            let u = bx - col as f64 * spec.square_length - marker_inset;
            let v = by - row as f64 * spec.square_length - marker_inset;
            if u < 0.0 || v < 0.0 || u >= spec.marker_length || v >= spec.marker_length {
                return;
            }

            let cu = ((u / cell_length) as usize).min(cells - 1);
            let cv = ((v / cell_length) as usize).min(cells - 1);

            let in_border = cu < border_bits
                || cv < border_bits
                || cu >= n + border_bits
                || cv >= n + border_bits;

            let white = !in_border && marker_bits[id as usize][(cv - border_bits) * n + cu - border_bits];
            *pixel = if white { 255 } else { 0 };
        });

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSpec;

    #[test]
    fn render_has_requested_size() -> Result<(), TargetError> {
        let board = CharucoBoard::new(BoardSpec::default())?;
        for (w, h, margin) in [(1000, 1400, 0), (333, 101, 10), (70, 50, 0)] {
            let image = render_board(&board, [w, h].into(), margin, 1)?;
            assert_eq!(image.size(), ImageSize { width: w, height: h });
        }
        Ok(())
    }

    #[test]
    fn render_layout_is_centered() -> Result<(), TargetError> {
        let board = CharucoBoard::new(BoardSpec::default())?;
        let layout = RenderLayout::new(&board, [1000, 1400].into(), 0)?;
        // width limited: 1000 / 210 units
        assert!((layout.scale - 1000.0 / 210.0).abs() < 1e-12);
        assert_eq!(layout.offset_x, 0.0);
        assert!((layout.offset_y - 0.5 * (1400.0 - 150.0 * layout.scale)).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn render_squares_and_margin() -> Result<(), TargetError> {
        let board = CharucoBoard::new(BoardSpec::default())?;
        // 7x5 squares of 20 px plus a 10 px margin
        let image = render_board(&board, [160, 120].into(), 10, 1)?;
        let at = |x: usize, y: usize| image.as_slice()[y * 160 + x];

        // margin
        assert_eq!(at(5, 5), 255);
        // first square is black
        assert_eq!(at(15, 15), 0);
        // the white square (0, 1) has a white rim around its marker
        assert_eq!(at(31, 11), 255);
        // and the marker border is black
        assert_eq!(at(34, 14), 0);
        Ok(())
    }

    #[test]
    fn render_rejects_empty_area() -> Result<(), TargetError> {
        let board = CharucoBoard::new(BoardSpec::default())?;
        assert_eq!(
            render_board(&board, [20, 20].into(), 10, 1),
            Err(TargetError::InvalidRenderSize(20, 20, 10))
        );
        Ok(())
    }
}
