use charuco_calib::homography::{find_homography_dlt, project_homography};
use charuco_image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::{
    board::CharucoBoard,
    detector::Marker,
    subpix::{refine_corner, SubPixConfig},
};

/// Options for locating chessboard corners from detected markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharucoParams {
    /// Number of detected neighbour markers a corner needs.
    pub min_markers: usize,
    /// Smallest half window of the sub-pixel search.
    pub min_half_window: usize,
    /// Largest half window of the sub-pixel search.
    pub max_half_window: usize,
    /// Stopping criteria of the sub-pixel search.
    pub subpix: SubPixConfig,
}

impl Default for CharucoParams {
    fn default() -> Self {
        Self {
            min_markers: 2,
            min_half_window: 2,
            max_half_window: 10,
            subpix: SubPixConfig::default(),
        }
    }
}

/// Chessboard corners found in one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharucoCorners {
    /// Pixel positions, pixel centres at integers.
    pub positions: Vec<[f32; 2]>,
    /// Board corner ids, ascending and parallel to `positions`.
    pub ids: Vec<u32>,
}

impl CharucoCorners {
    /// Number of corners.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no corner was found.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Locate the chessboard corners of a board from its detected markers.
///
/// Each corner is predicted through a homography fitted to the markers
/// around it and then refined on the image. The search window shrinks near
/// the markers so that their edges do not pull the corner away.
///
/// # Arguments
///
/// * `markers` - Detected markers, ids not on the board are ignored.
/// * `gray` - The image the markers were detected in.
/// * `board` - The board.
/// * `params` - Interpolation options.
pub fn interpolate_corners(
    markers: &[Marker],
    gray: &GrayImage,
    board: &CharucoBoard,
    params: &CharucoParams,
) -> CharucoCorners {
    let detected = |id: u32| markers.iter().find(|m| m.id == id);
    let mut corners = CharucoCorners::default();

    for corner_id in 0..board.num_corners() as u32 {
        let adjacent: Vec<&Marker> = board
            .corner_adjacent_markers(corner_id)
            .into_iter()
            .filter_map(detected)
            .collect();
        if adjacent.is_empty() || adjacent.len() < params.min_markers {
            continue;
        }

        let mut object = Vec::with_capacity(4 * adjacent.len());
        let mut image = Vec::with_capacity(4 * adjacent.len());
        for marker in &adjacent {
            let Some(obj) = board.marker_object_corners(marker.id) else {
                continue;
            };
            object.extend(obj);
            image.extend(marker.corners.map(|c| [c[0] as f64, c[1] as f64]));
        }

        let Ok(h) = find_homography_dlt(&object, &image) else {
            log::trace!("corner {corner_id}: degenerate marker homography");
            continue;
        };
        let Some([bx, by, _]) = board.chessboard_corner(corner_id) else {
            continue;
        };
        let predicted = project_homography(&h, [bx, by]);

        let clearance = image
            .iter()
            .map(|q| (q[0] - predicted[0]).hypot(q[1] - predicted[1]))
            .fold(f64::MAX, f64::min);
        let half_win = ((0.5 * clearance).floor() as usize)
            .clamp(params.min_half_window, params.max_half_window.max(params.min_half_window));

        let Some(refined) = refine_corner(gray, predicted, half_win, &params.subpix) else {
            log::trace!("corner {corner_id}: sub-pixel refinement failed");
            continue;
        };

        corners.ids.push(corner_id);
        corners.positions.push([refined[0] as f32, refined[1] as f32]);
    }

    corners
}
