mod common;

use charuco_app::{
    calibrate::{collect_observations, run_calibration, SkipReason},
    config::{AppConfig, CAMERA_MATRIX_FILE, DIST_COEFFS_FILE},
    AppError, VisionError,
};
use charuco_io::{
    image_set::file_name,
    npy::{read_camera_matrix, read_dist_coeffs},
    png::write_image_png_gray8,
    ImageSet,
};
use charuco_target::{BoardSpec, CharucoBoard};
use common::{scene, MockBackend, CAMERA_MATRIX, DIST_COEFFS, FAILING_SCENE};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_scenes(config: &AppConfig, values: &[(usize, u8)]) -> TestResult {
    let dir = config.image_dir();
    std::fs::create_dir_all(&dir)?;
    for &(index, value) in values {
        write_image_png_gray8(dir.join(file_name(index)), &scene(value))?;
    }
    Ok(())
}

fn config_in(dir: &std::path::Path) -> AppConfig {
    AppConfig {
        workdir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn three_valid_two_without_markers() -> TestResult {
    let tmp_dir = tempfile::tempdir()?;
    let config = config_in(tmp_dir.path());
    write_scenes(&config, &[(0, 6), (1, 0), (2, 9), (3, 0), (10, 4)])?;

    let board = CharucoBoard::new(BoardSpec::default())?;
    let mut backend = MockBackend::default();
    let report = run_calibration(&config, &board, &mut backend)?;

    // the solver saw the usable images once, in index order
    assert_eq!(backend.calibrations, vec![vec![6, 9, 4]]);
    assert_eq!(report.used_images.len(), 3);
    assert_eq!(report.skipped.len(), 2);
    assert!(report
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::NoMarkers));
    assert_eq!(report.skipped[0].path, config.image_dir().join("img_calib_1.png"));

    let out_dir = config.out_dir();
    assert_eq!(report.artifacts.camera_matrix, out_dir.join(CAMERA_MATRIX_FILE));
    assert_eq!(read_camera_matrix(&report.artifacts.camera_matrix)?, CAMERA_MATRIX);
    assert_eq!(read_dist_coeffs(out_dir.join(DIST_COEFFS_FILE))?, DIST_COEFFS);
    Ok(())
}

#[test]
fn corner_threshold_is_inclusive() -> TestResult {
    let tmp_dir = tempfile::tempdir()?;
    let config = config_in(tmp_dir.path());
    write_scenes(&config, &[(0, 3), (1, 4), (2, 5), (3, 2)])?;

    let board = CharucoBoard::new(BoardSpec::default())?;
    let mut backend = MockBackend::default();
    let images = ImageSet::scan(config.image_dir())?;
    let set = collect_observations(&images, &board, &mut backend, 4)?;

    let counts: Vec<usize> = set.observations.iter().map(|o| o.len()).collect();
    assert_eq!(counts, vec![4, 5]);
    assert_eq!(
        set.skipped.iter().map(|s| s.reason.clone()).collect::<Vec<_>>(),
        vec![SkipReason::NotEnoughCorners(3), SkipReason::NotEnoughCorners(2)]
    );
    assert_eq!(set.image_size, Some([32, 24].into()));
    Ok(())
}

#[test]
fn detection_errors_skip_the_image() -> TestResult {
    let tmp_dir = tempfile::tempdir()?;
    let config = config_in(tmp_dir.path());
    write_scenes(&config, &[(0, 6), (1, FAILING_SCENE), (2, 5)])?;

    let board = CharucoBoard::new(BoardSpec::default())?;
    let mut backend = MockBackend::default();
    let report = run_calibration(&config, &board, &mut backend)?;

    assert_eq!(backend.calibrations, vec![vec![6, 5]]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, config.image_dir().join("img_calib_1.png"));
    assert!(matches!(report.skipped[0].reason, SkipReason::DetectionFailed(_)));
    Ok(())
}

#[test]
fn included_views_do_not_depend_on_order() -> TestResult {
    let board = CharucoBoard::new(BoardSpec::default())?;
    let values = [7u8, 0, 4, 2, 11];

    let mut counts = Vec::new();
    for order in [[0usize, 1, 2, 3, 4], [4, 2, 0, 3, 1]] {
        let tmp_dir = tempfile::tempdir()?;
        let config = config_in(tmp_dir.path());
        let indexed: Vec<(usize, u8)> = order.iter().enumerate().map(|(i, &k)| (i, values[k])).collect();
        write_scenes(&config, &indexed)?;

        let images = ImageSet::scan(config.image_dir())?;
        let set = collect_observations(&images, &board, &mut MockBackend::default(), 4)?;
        let mut lens: Vec<usize> = set.observations.iter().map(|o| o.len()).collect();
        lens.sort_unstable();
        counts.push(lens);
    }
    assert_eq!(counts[0], vec![4, 7, 11]);
    assert_eq!(counts[0], counts[1]);
    Ok(())
}

#[test]
fn no_usable_image_writes_nothing() -> TestResult {
    let tmp_dir = tempfile::tempdir()?;
    let config = config_in(tmp_dir.path());
    write_scenes(&config, &[(0, 0), (1, 2)])?;

    let board = CharucoBoard::new(BoardSpec::default())?;
    let mut backend = MockBackend::default();
    let result = run_calibration(&config, &board, &mut backend);

    assert!(matches!(result, Err(AppError::NoObservations(_))));
    assert!(backend.calibrations.is_empty());
    assert!(!config.out_dir().exists());
    Ok(())
}

#[test]
fn solver_failure_writes_nothing() -> TestResult {
    let tmp_dir = tempfile::tempdir()?;
    let config = config_in(tmp_dir.path());
    write_scenes(&config, &[(0, 8), (1, 8)])?;

    let board = CharucoBoard::new(BoardSpec::default())?;
    let mut backend = MockBackend {
        fail_solver: true,
        ..Default::default()
    };
    let result = run_calibration(&config, &board, &mut backend);

    assert!(matches!(
        result,
        Err(AppError::Vision(VisionError::Calibration(_)))
    ));
    assert!(!config.out_dir().join(CAMERA_MATRIX_FILE).exists());
    assert!(!config.out_dir().join(DIST_COEFFS_FILE).exists());
    Ok(())
}

#[test]
fn malformed_image_name_fails_fast() -> TestResult {
    let tmp_dir = tempfile::tempdir()?;
    let config = config_in(tmp_dir.path());
    write_scenes(&config, &[(0, 8)])?;
    write_image_png_gray8(config.image_dir().join("snapshot.png"), &scene(8))?;

    let board = CharucoBoard::new(BoardSpec::default())?;
    let mut backend = MockBackend::default();
    let result = run_calibration(&config, &board, &mut backend);

    assert!(matches!(result, Err(AppError::Io(_))));
    assert!(backend.calibrations.is_empty());
    Ok(())
}
