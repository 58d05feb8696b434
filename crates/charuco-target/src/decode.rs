use charuco_calib::homography::{find_homography_dlt, project_homography};
use charuco_image::{interpolation::bilinear_u8, GrayImage};
use serde::{Deserialize, Serialize};

use crate::{dictionary::Dictionary, quad::Quad};

// sample positions inside a cell, in cell units
const CELL_SAMPLES: [f64; 3] = [0.3, 0.5, 0.7];

/// Options for reading the bits of a marker candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Width of the black marker border, in cells.
    pub border_bits: usize,
    /// Minimum difference between the brightest and darkest cell.
    pub min_contrast: f64,
    /// Maximum share of white border cells.
    pub max_erroneous_border_rate: f64,
    /// Share of the dictionary's correction capacity that is used.
    pub error_correction_rate: f64,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            border_bits: 1,
            min_contrast: 30.0,
            max_erroneous_border_rate: 0.35,
            error_correction_rate: 0.6,
        }
    }
}

/// A decoded marker candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedQuad {
    /// The marker id.
    pub id: u32,
    /// Corners starting at the marker's top-left, clockwise.
    pub corners: [[f64; 2]; 4],
    /// Number of corrected bits.
    pub distance: u32,
}

/// Mean intensity of each cell of a `cells x cells` grid spanning the quad, row-major.
pub fn read_cells(gray: &GrayImage, quad: &Quad, cells: usize) -> Option<Vec<f64>> {
    let side = cells as f64;
    let canonical = [[0.0, 0.0], [side, 0.0], [side, side], [0.0, side]];
    let h = find_homography_dlt(&canonical, &quad.corners).ok()?;

    let means = (0..cells * cells)
        .map(|idx| {
            let (cx, cy) = ((idx % cells) as f64, (idx / cells) as f64);
            let mut sum = 0.0;
            for oy in CELL_SAMPLES {
                for ox in CELL_SAMPLES {
                    let [u, v] = project_homography(&h, [cx + ox, cy + oy]);
                    sum += bilinear_u8(gray, u, v, 0);
                }
            }
            sum / (CELL_SAMPLES.len() * CELL_SAMPLES.len()) as f64
        })
        .collect();

    Some(means)
}

/// Read the bits inside a quad and look them up in the dictionary.
///
/// The candidate is rejected when the cells have too little contrast, when
/// too many border cells are white or when no marker is close enough.
pub fn decode_quad(
    gray: &GrayImage,
    quad: &Quad,
    dictionary: &Dictionary,
    config: &DecodeConfig,
) -> Option<DecodedQuad> {
    let n = dictionary.marker_size();
    let border = config.border_bits;
    let cells = n + 2 * border;

    let means = read_cells(gray, quad, cells)?;
    let (lo, hi) = means
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &m| (lo.min(m), hi.max(m)));
    if hi - lo < config.min_contrast {
        return None;
    }
    let threshold = 0.5 * (lo + hi);
    let white: Vec<bool> = means.iter().map(|&m| m > threshold).collect();

    let in_border = |x: usize, y: usize| x < border || y < border || x >= n + border || y >= n + border;
    let border_errors = (0..cells * cells)
        .filter(|&idx| in_border(idx % cells, idx / cells) && white[idx])
        .count();
    let border_cells = cells * cells - n * n;
    if border_errors as f64 > (config.max_erroneous_border_rate * border_cells as f64).floor() {
        return None;
    }

    let bits: Vec<bool> = (0..n * n)
        .map(|idx| white[(idx / n + border) * cells + idx % n + border])
        .collect();

    let max_correction =
        (dictionary.max_correction_bits() as f64 * config.error_correction_rate).floor() as u32;
    let found = dictionary.identify(&bits, max_correction)?;

    // the observed pattern is the code turned `rotation` times clockwise
    let corners = std::array::from_fn(|i| quad.corners[(i + found.rotation) % 4]);

    Some(DecodedQuad {
        id: found.id,
        corners,
        distance: found.distance,
    })
}
