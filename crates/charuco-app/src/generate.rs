use std::path::PathBuf;

use charuco_io::png::write_image_png_gray8;
use charuco_target::CharucoBoard;

use crate::{
    backend::VisionBackend,
    config::{AppConfig, BOARD_FILE},
    error::AppError,
};

/// Render the board and write it to `<workdir>/out/calibration-charuco.png`.
///
/// # Returns
///
/// The path of the written image.
pub fn generate_board(
    config: &AppConfig,
    board: &CharucoBoard,
    backend: &mut impl VisionBackend,
) -> Result<PathBuf, AppError> {
    let render = &config.render;
    let image = backend.render_board(
        board,
        [render.width, render.height].into(),
        render.margin,
        render.border_bits,
    )?;

    let out_dir = config.out_dir();
    std::fs::create_dir_all(&out_dir).map_err(charuco_io::IoError::from)?;
    let path = out_dir.join(BOARD_FILE);
    write_image_png_gray8(&path, &image)?;

    log::info!(
        "wrote {}x{} board to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(path)
}
