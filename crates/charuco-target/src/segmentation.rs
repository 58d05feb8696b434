use std::collections::HashMap;

use charuco_image::GrayImage;

use crate::union_find::UnionFind;

/// A connected set of dark pixels.
///
/// Only the outline is kept: the first and last pixel of each row and of
/// each column of the component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Number of pixels.
    pub num_pixels: usize,
    /// Inclusive bounding box `[min_x, min_y, max_x, max_y]`.
    pub bbox: [usize; 4],
    /// Whether a pixel lies on the image border.
    pub touches_border: bool,
    /// `(y, min_x, max_x)` for each row, top to bottom.
    pub row_extremes: Vec<(usize, usize, usize)>,
    /// `x -> (min_y, max_y)` for each column.
    pub col_extremes: HashMap<usize, (usize, usize)>,
}

impl Component {
    fn new(x: usize, y: usize) -> Self {
        Self {
            num_pixels: 0,
            bbox: [x, y, x, y],
            touches_border: false,
            row_extremes: Vec::new(),
            col_extremes: HashMap::new(),
        }
    }

    fn push(&mut self, x: usize, y: usize, on_border: bool) {
        self.num_pixels += 1;
        self.bbox[0] = self.bbox[0].min(x);
        self.bbox[1] = self.bbox[1].min(y);
        self.bbox[2] = self.bbox[2].max(x);
        self.bbox[3] = self.bbox[3].max(y);
        self.touches_border |= on_border;

        // pixels arrive in raster order
        match self.row_extremes.last_mut() {
            Some(row) if row.0 == y => row.2 = x,
            _ => self.row_extremes.push((y, x, x)),
        }
        self.col_extremes
            .entry(x)
            .and_modify(|c| c.1 = y)
            .or_insert((y, y));
    }

    /// Perimeter of the bounding box in pixels.
    pub fn bbox_perimeter(&self) -> usize {
        2 * ((self.bbox[2] - self.bbox[0] + 1) + (self.bbox[3] - self.bbox[1] + 1))
    }

    /// The outline pixels, sorted and without duplicates.
    pub fn boundary_points(&self) -> Vec<[i64; 2]> {
        let mut points: Vec<[i64; 2]> = self
            .row_extremes
            .iter()
            .flat_map(|&(y, x0, x1)| [[x0 as i64, y as i64], [x1 as i64, y as i64]])
            .chain(
                self.col_extremes
                    .iter()
                    .flat_map(|(&x, &(y0, y1))| [[x as i64, y0 as i64], [x as i64, y1 as i64]]),
            )
            .collect();
        points.sort_unstable();
        points.dedup();
        points
    }
}

/// Finds the 8-connected components of the non-zero pixels of a binary image.
///
/// # Arguments
///
/// * `src` - The binary image, non-zero pixels are foreground.
/// * `uf` - Scratch union-find, resized to the image.
///
/// # Returns
///
/// The components in order of their first pixel.
pub fn find_connected_components(src: &GrayImage, uf: &mut UnionFind) -> Vec<Component> {
    let (width, height) = (src.width(), src.height());
    let data = src.as_slice();
    uf.resize(data.len());

    data.iter().enumerate().for_each(|(i, &pixel)| {
        if pixel == 0 {
            return;
        }
        let x = i % width;
        let y = i / width;

        if x + 1 < width && data[i + 1] != 0 {
            uf.connect(i, i + 1);
        }

        if y + 1 < height {
            let below = i + width;
            if data[below] != 0 {
                uf.connect(i, below);
            }
            if x > 0 && data[below - 1] != 0 {
                uf.connect(i, below - 1);
            }
            if x + 1 < width && data[below + 1] != 0 {
                uf.connect(i, below + 1);
            }
        }
    });

    let mut index_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Component> = Vec::new();

    for (i, &pixel) in data.iter().enumerate() {
        if pixel == 0 {
            continue;
        }
        let (x, y) = (i % width, i / width);
        let root = uf.get_representative(i);
        let idx = *index_of_root.entry(root).or_insert_with(|| {
            components.push(Component::new(x, y));
            components.len() - 1
        });
        let on_border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
        components[idx].push(x, y, on_border);
    }

    components
}
