use serde::{Deserialize, Serialize};

use crate::{
    dictionary::{Dictionary, DictionaryKind},
    errors::TargetError,
};

/// Geometry of a ChArUco board.
///
/// Lengths share one arbitrary unit (pixels, millimetres, ...); calibration
/// results inherit that unit for the translation of the views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardSpec {
    /// Number of squares along x.
    pub columns: usize,
    /// Number of squares along y.
    pub rows: usize,
    /// Side length of a chessboard square.
    pub square_length: f64,
    /// Side length of a marker, border included.
    pub marker_length: f64,
    /// The marker dictionary.
    pub dictionary: DictionaryKind,
}

impl Default for BoardSpec {
    fn default() -> Self {
        Self {
            columns: 7,
            rows: 5,
            square_length: 30.0,
            marker_length: 20.0,
            dictionary: DictionaryKind::Dict6x6_50,
        }
    }
}

impl BoardSpec {
    /// Number of white squares, i.e. markers on the board.
    pub fn num_markers(&self) -> usize {
        (self.columns * self.rows) / 2
    }

    /// Number of inner chessboard corners.
    pub fn num_corners(&self) -> usize {
        self.columns.saturating_sub(1) * self.rows.saturating_sub(1)
    }
}

/// A validated ChArUco board.
///
/// Square `(r, c)` is black when `r + c` is even. Markers fill the white
/// squares in row-major order with ids `0..`. The board frame has x to the
/// right, y down and z = 0 on the board plane, with the origin at the outer
/// top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct CharucoBoard {
    spec: BoardSpec,
    dictionary: Dictionary,
    // (row, col) of the square holding each marker
    marker_squares: Vec<(usize, usize)>,
}

impl CharucoBoard {
    /// Validate `spec` and build the board with its built-in dictionary.
    pub fn new(spec: BoardSpec) -> Result<Self, TargetError> {
        Self::with_dictionary(spec, Dictionary::new(spec.dictionary))
    }

    /// Validate `spec` and build the board with a loaded dictionary.
    ///
    /// `spec.dictionary` is ignored.
    pub fn with_dictionary(spec: BoardSpec, dictionary: Dictionary) -> Result<Self, TargetError> {
        if spec.columns < 2 || spec.rows < 2 {
            return Err(TargetError::InvalidBoardShape(spec.columns, spec.rows));
        }

        if !(spec.square_length > 0.0
            && spec.marker_length > 0.0
            && spec.marker_length < spec.square_length)
        {
            return Err(TargetError::InvalidMarkerLength(
                spec.square_length,
                spec.marker_length,
            ));
        }

        if dictionary.len() < spec.num_markers() {
            return Err(TargetError::DictionaryTooSmall(
                spec.num_markers(),
                dictionary.len(),
            ));
        }

        let marker_squares = (0..spec.rows)
            .flat_map(|r| (0..spec.columns).map(move |c| (r, c)))
            .filter(|(r, c)| (r + c) % 2 == 1)
            .collect();

        Ok(Self {
            spec,
            dictionary,
            marker_squares,
        })
    }

    /// The board geometry.
    #[inline]
    pub fn spec(&self) -> &BoardSpec {
        &self.spec
    }

    /// The marker dictionary.
    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Number of markers on the board.
    #[inline]
    pub fn num_markers(&self) -> usize {
        self.marker_squares.len()
    }

    /// Number of inner chessboard corners.
    #[inline]
    pub fn num_corners(&self) -> usize {
        self.spec.num_corners()
    }

    /// Whether the square `(row, col)` is black.
    #[inline]
    pub fn is_black_square(&self, row: usize, col: usize) -> bool {
        (row + col) % 2 == 0
    }

    /// The marker id in square `(row, col)`, if the square is white.
    pub fn marker_at(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.spec.rows || col >= self.spec.columns || self.is_black_square(row, col) {
            return None;
        }
        // white squares before this one in row-major order
        let index = row * self.spec.columns + col;
        Some((index / 2) as u32)
    }

    /// The square `(row, col)` holding a marker.
    pub fn marker_square(&self, id: u32) -> Option<(usize, usize)> {
        self.marker_squares.get(id as usize).copied()
    }

    /// Board coordinates of the four marker corners: top-left, top-right,
    /// bottom-right, bottom-left.
    pub fn marker_object_corners(&self, id: u32) -> Option<[[f64; 2]; 4]> {
        let (r, c) = self.marker_square(id)?;
        let s = self.spec.square_length;
        let m = self.spec.marker_length;
        let x0 = c as f64 * s + 0.5 * (s - m);
        let y0 = r as f64 * s + 0.5 * (s - m);
        Some([[x0, y0], [x0 + m, y0], [x0 + m, y0 + m], [x0, y0 + m]])
    }

    /// Board coordinates of the chessboard corner with the given id.
    pub fn chessboard_corner(&self, id: u32) -> Option<[f64; 3]> {
        let (r, c) = self.corner_grid_position(id)?;
        let s = self.spec.square_length;
        Some([(c + 1) as f64 * s, (r + 1) as f64 * s, 0.0])
    }

    /// All chessboard corners ordered by id.
    pub fn chessboard_corners(&self) -> Vec<[f64; 3]> {
        (0..self.num_corners() as u32)
            .filter_map(|id| self.chessboard_corner(id))
            .collect()
    }

    /// The markers in the squares touching the chessboard corner.
    pub fn corner_adjacent_markers(&self, id: u32) -> Vec<u32> {
        let Some((r, c)) = self.corner_grid_position(id) else {
            return Vec::new();
        };
        [(r, c), (r, c + 1), (r + 1, c), (r + 1, c + 1)]
            .into_iter()
            .filter_map(|(sr, sc)| self.marker_at(sr, sc))
            .collect()
    }

    fn corner_grid_position(&self, id: u32) -> Option<(usize, usize)> {
        let inner_cols = self.spec.columns - 1;
        let id = id as usize;
        if id >= self.num_corners() {
            return None;
        }
        Some((id / inner_cols, id % inner_cols))
    }
}
