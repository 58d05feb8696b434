use std::path::Path;

use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};

use crate::error::IoError;

/// Write a 2d float64 matrix to a NumPy `.npy` file (format v1.0, little-endian).
///
/// # Arguments
///
/// * `file_path` - The destination path. Existing files are overwritten.
/// * `matrix` - The matrix to persist.
pub fn write_npy_matrix(file_path: impl AsRef<Path>, matrix: &Array2<f64>) -> Result<(), IoError> {
    write_npy(file_path, matrix)?;
    Ok(())
}

/// Read a 2d float64 matrix from a NumPy `.npy` file.
pub fn read_npy_matrix(file_path: impl AsRef<Path>) -> Result<Array2<f64>, IoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    Ok(read_npy(file_path)?)
}

/// Persist a 3x3 camera matrix.
pub fn write_camera_matrix(
    file_path: impl AsRef<Path>,
    camera_matrix: &[[f64; 3]; 3],
) -> Result<(), IoError> {
    let matrix = Array2::from_shape_fn((3, 3), |(r, c)| camera_matrix[r][c]);
    write_npy_matrix(file_path, &matrix)
}

/// Load a 3x3 camera matrix, failing if the stored shape differs.
pub fn read_camera_matrix(file_path: impl AsRef<Path>) -> Result<[[f64; 3]; 3], IoError> {
    let matrix = read_npy_matrix(file_path)?;
    check_shape(&matrix, [3, 3])?;

    let mut out = [[0.0; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, v) in row.iter_mut().enumerate() {
            *v = matrix[[r, c]];
        }
    }
    Ok(out)
}

/// Persist the distortion coefficients `(k1, k2, p1, p2, k3)` as a 1x5 row vector.
pub fn write_dist_coeffs(file_path: impl AsRef<Path>, dist: &[f64; 5]) -> Result<(), IoError> {
    let matrix = Array2::from_shape_fn((1, 5), |(_, c)| dist[c]);
    write_npy_matrix(file_path, &matrix)
}

/// Load the 1x5 distortion coefficients.
pub fn read_dist_coeffs(file_path: impl AsRef<Path>) -> Result<[f64; 5], IoError> {
    let matrix = read_npy_matrix(file_path)?;
    check_shape(&matrix, [1, 5])?;

    let mut out = [0.0; 5];
    for (c, v) in out.iter_mut().enumerate() {
        *v = matrix[[0, c]];
    }
    Ok(out)
}

fn check_shape(matrix: &Array2<f64>, expected: [usize; 2]) -> Result<(), IoError> {
    if matrix.shape() != &expected[..] {
        return Err(IoError::ShapeMismatch(
            expected.to_vec(),
            matrix.shape().to_vec(),
        ));
    }
    Ok(())
}
