#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// The vision operations behind the workflows.
pub mod backend;

/// Batch calibration from a stored image set.
pub mod calibrate;

/// Interactive capture of calibration images.
pub mod capture;

/// Command line parsing.
pub mod cli;

/// Application configuration.
pub mod config;

/// Error types of the application.
pub mod error;

/// Board image generation.
pub mod generate;

/// Live feedback during capture.
pub mod preview;

/// Camera and keyboard input.
pub mod sources;

pub use crate::backend::{NativeBackend, Observation, VisionBackend};
pub use crate::cli::Command;
pub use crate::config::AppConfig;
pub use crate::error::{AppError, CaptureError, VisionError};

/// Run one mode with the native backend.
pub fn run(command: Command, config: &AppConfig) -> Result<(), AppError> {
    let board = config.build_board()?;
    let mut backend = NativeBackend::new(
        &board,
        config.detector.clone(),
        config.charuco,
        config.calibration.solver.clone(),
    );

    match command {
        Command::GenerateBoard => {
            generate::generate_board(config, &board, &mut backend)?;
        }
        Command::Capture => {
            let mut frames = sources::open_camera(&config.camera)?;
            let mut keys = sources::TerminalKeys::new()?;
            let mut preview = open_preview(config.capture.preview)?;
            let outcome = capture::run_capture(
                config,
                &board,
                &mut backend,
                frames.as_mut(),
                &mut keys,
                preview.as_mut(),
            )?;
            log::info!(
                "capture {:?}: {} images saved from {} frames",
                outcome.state,
                outcome.saved.len(),
                outcome.frames_seen
            );
        }
        Command::Calibrate => {
            let report = calibrate::run_calibration(config, &board, &mut backend)?;
            log::info!(
                "calibrated from {} images, {} skipped",
                report.used_images.len(),
                report.skipped.len()
            );
        }
    }
    Ok(())
}

fn open_preview(enabled: bool) -> Result<Box<dyn preview::Preview>, CaptureError> {
    if !enabled {
        return Ok(Box::new(preview::NoPreview));
    }
    #[cfg(feature = "rerun")]
    {
        Ok(Box::new(preview::RerunPreview::spawn()?))
    }
    #[cfg(not(feature = "rerun"))]
    {
        Ok(Box::new(preview::LogPreview::default()))
    }
}
