use charuco_image::{interpolation::gradient_u8, GrayImage};
use serde::{Deserialize, Serialize};

/// Stopping criteria of the sub-pixel corner search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPixConfig {
    /// Maximum number of iterations.
    pub max_iters: usize,
    /// Stop once the corner moves less than this many pixels.
    pub eps: f64,
}

impl Default for SubPixConfig {
    fn default() -> Self {
        Self {
            max_iters: 30,
            eps: 0.01,
        }
    }
}

/// Refine a saddle corner to sub-pixel accuracy.
///
/// Finds the point `q` minimising `sum_p w_p * (g_p . (q - p))^2` over a
/// `(2 * half_win + 1)^2` window, with `g_p` the image gradient at `p` and
/// Gaussian-like weights `w_p`. At a corner every gradient is orthogonal to
/// the line from the corner to its sample.
///
/// # Arguments
///
/// * `gray` - The grayscale image.
/// * `initial` - The initial estimate, pixel centres at integers.
/// * `half_win` - Half the side of the search window, at least 1.
/// * `config` - Stopping criteria.
///
/// # Returns
///
/// The refined corner, or `None` when the window holds no structure or the
/// corner drifted farther than `half_win` from `initial`.
pub fn refine_corner(
    gray: &GrayImage,
    initial: [f64; 2],
    half_win: usize,
    config: &SubPixConfig,
) -> Option<[f64; 2]> {
    let hw = half_win.max(1) as i64;
    let inv = 1.0 / hw as f64;
    let [mut cx, mut cy] = initial;

    for _ in 0..config.max_iters {
        let (mut a, mut b, mut c) = (0.0, 0.0, 0.0);
        let (mut bb1, mut bb2) = (0.0, 0.0);

        for i in -hw..=hw {
            for j in -hw..=hw {
                let (px, py) = (cx + j as f64, cy + i as f64);
                let (gx, gy) = gradient_u8(gray, px, py);
                let (wx, wy) = (j as f64 * inv, i as f64 * inv);
                let w = (-wx * wx - wy * wy).exp();

                let gxx = gx * gx * w;
                let gxy = gx * gy * w;
                let gyy = gy * gy * w;
                a += gxx;
                b += gxy;
                c += gyy;
                bb1 += gxx * px + gxy * py;
                bb2 += gxy * px + gyy * py;
            }
        }

        let det = a * c - b * b;
        if det.abs() < 1e-9 {
            return None;
        }
        let nx = (c * bb1 - b * bb2) / det;
        let ny = (a * bb2 - b * bb1) / det;
        let step = (nx - cx).hypot(ny - cy);
        (cx, cy) = (nx, ny);

        if (cx - initial[0]).hypot(cy - initial[1]) > hw as f64 {
            return None;
        }
        if step < config.eps {
            break;
        }
    }

    Some([cx, cy])
}
