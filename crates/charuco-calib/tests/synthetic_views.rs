use charuco_calib::{
    calibrate_camera, camera::project_board_point, CalibError, CalibrationOptions,
    CameraIntrinsics, DistortionCoeffs, PlanarView, Pose,
};
use nalgebra::{Rotation3, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

const WIDTH: usize = 640;
const HEIGHT: usize = 480;

// inner corners of a 7x5 board with 30 unit squares
fn board_corners() -> Vec<[f64; 2]> {
    (1..5)
        .flat_map(|r| (1..7).map(move |c| [c as f64 * 30.0, r as f64 * 30.0]))
        .collect()
}

// board centre placed at `center` in camera coordinates
fn look_at(rvec: [f64; 3], center: [f64; 3]) -> Pose {
    let rotation = Rotation3::new(Vector3::from(rvec));
    let board_center = Vector3::new(105.0, 75.0, 0.0);
    let translation = Vector3::from(center) - rotation * board_center;
    Pose {
        rotation,
        translation,
    }
}

fn views(
    k: &CameraIntrinsics,
    d: &DistortionCoeffs,
    noise: f64,
    rng: &mut StdRng,
) -> Vec<PlanarView> {
    let deg = std::f64::consts::PI / 180.0;
    let poses = [
        ([20.0, 0.0, 0.0], [0.0, 0.0, 400.0]),
        ([-20.0, 0.0, 5.0], [20.0, -10.0, 420.0]),
        ([0.0, 25.0, 0.0], [-20.0, 10.0, 380.0]),
        ([0.0, -25.0, -5.0], [10.0, 20.0, 410.0]),
        ([15.0, 15.0, 10.0], [-30.0, -20.0, 430.0]),
        ([-15.0, 20.0, -10.0], [30.0, 15.0, 390.0]),
        ([25.0, -15.0, 0.0], [-10.0, 25.0, 400.0]),
        ([-25.0, -20.0, 15.0], [15.0, -25.0, 440.0]),
        ([10.0, -30.0, 0.0], [0.0, 0.0, 370.0]),
        ([-30.0, 10.0, -15.0], [-25.0, 5.0, 420.0]),
        ([5.0, 5.0, 30.0], [20.0, 20.0, 400.0]),
        ([30.0, 20.0, -20.0], [-15.0, -15.0, 450.0]),
    ];

    poses
        .iter()
        .map(|&(r, c)| {
            let pose = look_at([r[0] * deg, r[1] * deg, r[2] * deg], c);
            let object_points = board_corners();
            let image_points = object_points
                .iter()
                .filter_map(|&p| project_board_point(k, d, &pose, p))
                .map(|[u, v]| {
                    [
                        u + rng.random_range(-noise..=noise),
                        v + rng.random_range(-noise..=noise),
                    ]
                })
                .collect();
            PlanarView {
                object_points,
                image_points,
            }
        })
        .collect()
}

#[test]
fn twelve_noisy_views() -> Result<(), CalibError> {
    let k = CameraIntrinsics::new(800.0, 800.0, 320.0, 240.0);
    let d = DistortionCoeffs::from_array([-0.08, 0.0, 0.0, 0.0, 0.0]);
    let mut rng = StdRng::seed_from_u64(42);
    let views = views(&k, &d, 0.2, &mut rng);

    for view in &views {
        assert_eq!(view.image_points.len(), 24);
        assert!(view
            .image_points
            .iter()
            .all(|p| p[0] > 0.0 && p[1] > 0.0 && p[0] < WIDTH as f64 && p[1] < HEIGHT as f64));
    }

    let result = calibrate_camera(&views, (WIDTH, HEIGHT), &CalibrationOptions::default())?;

    assert!(
        result.reprojection_error < 1.0,
        "rms {}",
        result.reprojection_error
    );
    let fx = result.camera_matrix[0][0];
    let fy = result.camera_matrix[1][1];
    assert!((fx - 800.0).abs() < 40.0, "fx {fx}");
    assert!((fy - 800.0).abs() < 40.0, "fy {fy}");
    assert_eq!(result.camera_matrix[2], [0.0, 0.0, 1.0]);
    assert_eq!(result.view_poses.len(), 12);
    assert_eq!(result.per_view_errors.len(), 12);
    assert!(result.per_view_errors.iter().all(|e| *e < 1.0));
    Ok(())
}

#[test]
fn exact_views_reach_zero_error() -> Result<(), CalibError> {
    let k = CameraIntrinsics::new(650.0, 640.0, 300.0, 250.0);
    let d = DistortionCoeffs::from_array([0.05, -0.02, 0.001, -0.0005, 0.0]);
    let mut rng = StdRng::seed_from_u64(0);
    let views = views(&k, &d, 0.0, &mut rng);

    let options = CalibrationOptions {
        fix_k3: true,
        ..Default::default()
    };
    let result = calibrate_camera(&views, (WIDTH, HEIGHT), &options)?;

    assert!(result.reprojection_error < 1e-4, "rms {}", result.reprojection_error);
    assert!((result.camera_matrix[0][0] - 650.0).abs() < 0.5);
    assert!((result.camera_matrix[0][2] - 300.0).abs() < 0.5);
    assert_eq!(result.dist_coeffs[4], 0.0);
    Ok(())
}

#[test]
fn tangential_terms_can_be_fixed() -> Result<(), CalibError> {
    let k = CameraIntrinsics::new(800.0, 800.0, 320.0, 240.0);
    let d = DistortionCoeffs::default();
    let mut rng = StdRng::seed_from_u64(3);
    let views = views(&k, &d, 0.1, &mut rng);

    let options = CalibrationOptions {
        fix_k3: true,
        zero_tangent_dist: true,
        ..Default::default()
    };
    let result = calibrate_camera(&views[..4], (WIDTH, HEIGHT), &options)?;
    assert_eq!(result.dist_coeffs[2], 0.0);
    assert_eq!(result.dist_coeffs[3], 0.0);
    assert_eq!(result.dist_coeffs[4], 0.0);
    assert!(result.reprojection_error < 0.5);
    Ok(())
}
