//! Levenberg–Marquardt refinement of intrinsics, distortion and view poses.

use nalgebra::{DMatrix, DVector};

use crate::{
    camera::{project_board_point, CameraIntrinsics, DistortionCoeffs, Pose},
    error::CalibError,
    PlanarView,
};

/// Number of intrinsic parameters: fx, fy, cx, cy, k1, k2, p1, p2, k3.
pub const NUM_INTRINSIC_PARAMS: usize = 9;
/// Number of pose parameters per view: rotation vector and translation.
pub const NUM_POSE_PARAMS: usize = 6;

const BLOCK: usize = NUM_INTRINSIC_PARAMS + NUM_POSE_PARAMS;

/// Parameters controlling the LM refinement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LMParams {
    /// Maximum number of LM iterations.
    pub max_iters: usize,
    /// Convergence threshold on the relative decrease of the squared error.
    pub eps: f64,
    /// Initial damping factor (lambda).
    pub lambda_init: f64,
    /// Multiplicative factor to increase/decrease lambda.
    pub lambda_mul: f64,
}

impl Default for LMParams {
    fn default() -> Self {
        Self {
            max_iters: 100,
            eps: 1e-12,
            lambda_init: 1e-3,
            lambda_mul: 10.0,
        }
    }
}

/// Intrinsic parameters held constant during refinement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterMask {
    /// Keep `k3` at its initial value.
    pub fix_k3: bool,
    /// Keep `p1` and `p2` at their initial values.
    pub zero_tangent_dist: bool,
}

impl ParameterMask {
    /// Indices of the fixed intrinsic parameters.
    pub fn fixed(&self) -> Vec<usize> {
        let mut fixed = Vec::new();
        if self.zero_tangent_dist {
            fixed.extend([6, 7]);
        }
        if self.fix_k3 {
            fixed.push(8);
        }
        fixed
    }

    /// Number of free intrinsic parameters.
    pub fn num_free_intrinsics(&self) -> usize {
        NUM_INTRINSIC_PARAMS - self.fixed().len()
    }
}

/// Outcome of a refinement run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LMReport {
    /// Sum of squared reprojection errors at the solution.
    pub cost: f64,
    /// Number of iterations run.
    pub iterations: usize,
    /// Whether the relative decrease fell below `eps`.
    pub converged: bool,
}

fn pack(intrinsics: &CameraIntrinsics, distortion: &DistortionCoeffs, poses: &[Pose]) -> DVector<f64> {
    let mut x = DVector::zeros(NUM_INTRINSIC_PARAMS + NUM_POSE_PARAMS * poses.len());
    let d = distortion.to_array();
    let head = [
        intrinsics.fx,
        intrinsics.fy,
        intrinsics.cx,
        intrinsics.cy,
        d[0],
        d[1],
        d[2],
        d[3],
        d[4],
    ];
    x.rows_mut(0, NUM_INTRINSIC_PARAMS)
        .copy_from_slice(&head);
    for (v, pose) in poses.iter().enumerate() {
        let base = NUM_INTRINSIC_PARAMS + NUM_POSE_PARAMS * v;
        x.rows_mut(base, 3).copy_from_slice(&pose.rvec());
        x.rows_mut(base + 3, 3).copy_from_slice(&pose.tvec());
    }
    x
}

fn unpack_intrinsics(p: &[f64]) -> (CameraIntrinsics, DistortionCoeffs) {
    (
        CameraIntrinsics::new(p[0], p[1], p[2], p[3]),
        DistortionCoeffs::from_array([p[4], p[5], p[6], p[7], p[8]]),
    )
}

fn unpack_pose(p: &[f64]) -> Pose {
    Pose::from_rvec_tvec([p[0], p[1], p[2]], [p[3], p[4], p[5]])
}

/// Residuals of one view written to `out`; returns the squared error sum.
fn view_residuals(intr: &[f64], pose: &[f64], view: &PlanarView, out: &mut [f64]) -> f64 {
    let (k, d) = unpack_intrinsics(intr);
    let pose = unpack_pose(pose);

    let mut sum_sq = 0.0;
    for (i, (obj, img)) in view
        .object_points
        .iter()
        .zip(view.image_points.iter())
        .enumerate()
    {
        match project_board_point(&k, &d, &pose, *obj) {
            Some(uv) => {
                let du = uv[0] - img[0];
                let dv = uv[1] - img[1];
                out[2 * i] = du;
                out[2 * i + 1] = dv;
                sum_sq += du.mul_add(du, dv * dv);
            }
            None => {
                out[2 * i] = 0.0;
                out[2 * i + 1] = 0.0;
                sum_sq = f64::INFINITY;
            }
        }
    }
    sum_sq
}

// [intrinsics | pose of view v] gathered in one block
fn view_block(x: &DVector<f64>, v: usize) -> [f64; BLOCK] {
    let mut block = [0.0; BLOCK];
    let base = NUM_INTRINSIC_PARAMS + NUM_POSE_PARAMS * v;
    block[..NUM_INTRINSIC_PARAMS].copy_from_slice(&x.as_slice()[..NUM_INTRINSIC_PARAMS]);
    block[NUM_INTRINSIC_PARAMS..].copy_from_slice(&x.as_slice()[base..base + NUM_POSE_PARAMS]);
    block
}

fn total_cost(x: &DVector<f64>, views: &[PlanarView], scratch: &mut Vec<f64>) -> f64 {
    views
        .iter()
        .enumerate()
        .map(|(v, view)| {
            let block = view_block(x, v);
            scratch.resize(2 * view.object_points.len(), 0.0);
            view_residuals(
                &block[..NUM_INTRINSIC_PARAMS],
                &block[NUM_INTRINSIC_PARAMS..],
                view,
                scratch,
            )
        })
        .sum()
}

// global index of the k-th entry of the block of view v
#[inline]
fn global_index(v: usize, k: usize) -> usize {
    if k < NUM_INTRINSIC_PARAMS {
        k
    } else {
        NUM_INTRINSIC_PARAMS + NUM_POSE_PARAMS * v + (k - NUM_INTRINSIC_PARAMS)
    }
}

// central difference step for the k-th entry of a block
#[inline]
fn step_size(k: usize, value: f64) -> f64 {
    const H_ROT: f64 = 1e-7; // radians
    if (NUM_INTRINSIC_PARAMS..NUM_INTRINSIC_PARAMS + 3).contains(&k) {
        H_ROT
    } else {
        1e-7 * value.abs().max(1.0)
    }
}

/// Build the normal equations `A = J^T J`, `g = J^T r` one view at a time.
fn normal_equations(x: &DVector<f64>, views: &[PlanarView]) -> (DMatrix<f64>, DVector<f64>) {
    let p = x.len();
    let mut a = DMatrix::<f64>::zeros(p, p);
    let mut g = DVector::<f64>::zeros(p);

    for (v, view) in views.iter().enumerate() {
        let m = 2 * view.object_points.len();
        let block = view_block(x, v);

        let mut r = vec![0.0; m];
        let mut rp = vec![0.0; m];
        let mut rm = vec![0.0; m];
        view_residuals(
            &block[..NUM_INTRINSIC_PARAMS],
            &block[NUM_INTRINSIC_PARAMS..],
            view,
            &mut r,
        );

        let mut jac = DMatrix::<f64>::zeros(m, BLOCK);
        for k in 0..BLOCK {
            let h = step_size(k, block[k]);
            let mut plus = block;
            let mut minus = block;
            plus[k] += h;
            minus[k] -= h;
            view_residuals(
                &plus[..NUM_INTRINSIC_PARAMS],
                &plus[NUM_INTRINSIC_PARAMS..],
                view,
                &mut rp,
            );
            view_residuals(
                &minus[..NUM_INTRINSIC_PARAMS],
                &minus[NUM_INTRINSIC_PARAMS..],
                view,
                &mut rm,
            );
            for i in 0..m {
                jac[(i, k)] = (rp[i] - rm[i]) / (2.0 * h);
            }
        }

        let jtj = jac.transpose() * &jac;
        let jtr = jac.transpose() * DVector::from_vec(r);

        for i in 0..BLOCK {
            let gi = global_index(v, i);
            g[gi] += jtr[i];
            for j in 0..BLOCK {
                a[(gi, global_index(v, j))] += jtj[(i, j)];
            }
        }
    }

    (a, g)
}

/// Refine intrinsics, distortion and poses jointly to minimise the pixel
/// reprojection error over all views.
///
/// The estimates are updated in place.
pub fn refine_calibration(
    views: &[PlanarView],
    intrinsics: &mut CameraIntrinsics,
    distortion: &mut DistortionCoeffs,
    poses: &mut [Pose],
    mask: &ParameterMask,
    params: &LMParams,
) -> Result<LMReport, CalibError> {
    if views.is_empty() {
        return Err(CalibError::NoViews);
    }
    if views.len() != poses.len() {
        return Err(CalibError::PoseCountMismatch(views.len(), poses.len()));
    }

    let fixed = mask.fixed();
    let mut x = pack(intrinsics, distortion, poses);
    let mut scratch = Vec::new();

    let mut cost = total_cost(&x, views, &mut scratch);
    if !cost.is_finite() {
        return Err(CalibError::NonFinite);
    }

    let mut lambda = params.lambda_init;
    let mut iters = 0usize;
    let mut converged = false;

    while iters < params.max_iters {
        iters += 1;

        let (mut a, mut g) = normal_equations(&x, views);
        for &i in &fixed {
            a.row_mut(i).fill(0.0);
            a.column_mut(i).fill(0.0);
            a[(i, i)] = 1.0;
            g[i] = 0.0;
        }

        // retry with more damping until a step decreases the cost
        let mut accepted = false;
        while lambda < 1e16 {
            let mut damped = a.clone();
            for d in 0..damped.nrows() {
                damped[(d, d)] += lambda * a[(d, d)].max(1e-12);
            }

            let Some(chol) = damped.cholesky() else {
                lambda *= params.lambda_mul;
                continue;
            };
            let delta = chol.solve(&(-&g));
            let x_new = &x + &delta;
            let cost_new = total_cost(&x_new, views, &mut scratch);

            if cost_new.is_finite() && cost_new < cost {
                let decrease = cost - cost_new;
                x = x_new;
                cost = cost_new;
                lambda = (lambda / params.lambda_mul).max(1e-12);
                accepted = true;
                converged = decrease <= params.eps * cost.max(f64::MIN_POSITIVE);
                break;
            }
            lambda *= params.lambda_mul;
        }

        if !accepted {
            // no descent direction left
            converged = true;
            break;
        }
        if converged {
            break;
        }
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(CalibError::NonFinite);
    }

    let (k, d) = unpack_intrinsics(&x.as_slice()[..NUM_INTRINSIC_PARAMS]);
    *intrinsics = k;
    *distortion = d;
    for (v, pose) in poses.iter_mut().enumerate() {
        let base = NUM_INTRINSIC_PARAMS + NUM_POSE_PARAMS * v;
        *pose = unpack_pose(&x.as_slice()[base..base + NUM_POSE_PARAMS]);
    }

    log::debug!("calibration refinement: cost {cost:.6} after {iters} iterations, converged: {converged}");

    Ok(LMReport {
        cost,
        iterations: iters,
        converged,
    })
}

/// Root-mean-square reprojection error of one view.
pub fn view_rms(
    intrinsics: &CameraIntrinsics,
    distortion: &DistortionCoeffs,
    pose: &Pose,
    view: &PlanarView,
) -> f64 {
    let n = view.object_points.len();
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = view
        .object_points
        .iter()
        .zip(view.image_points.iter())
        .map(|(obj, img)| match project_board_point(intrinsics, distortion, pose, *obj) {
            Some(uv) => (uv[0] - img[0]).powi(2) + (uv[1] - img[1]).powi(2),
            None => f64::INFINITY,
        })
        .sum();
    (sum_sq / n as f64).sqrt()
}
