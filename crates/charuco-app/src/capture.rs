use std::{path::PathBuf, time::Duration};

use charuco_image::{color::gray_from_rgb_u8, GrayImage, Image, RgbImage};
use charuco_io::{image_set::file_name, png::write_image_png_rgb8, ImageSet};
use charuco_target::{CharucoBoard, CharucoCorners};

use crate::{
    backend::{find_board, VisionBackend},
    config::AppConfig,
    error::CaptureError,
    preview::{FrameOverlay, Preview},
};

/// A source of colour frames, e.g. a camera.
pub trait FrameSource {
    /// Read the next frame, or `None` when none arrived before the timeout.
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;
}

/// Keys the capture loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Cancel the session.
    Escape,
    /// Save the current frame.
    Space,
    /// Any other key.
    Other,
}

/// A source of key presses.
pub trait KeySource {
    /// Wait at most `timeout` for a key press.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>, CaptureError>;
}

/// State of the capture loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Waiting for the next frame.
    AwaitingFrame,
    /// Looking for markers and corners in a frame.
    Detecting,
    /// The last frame was saved.
    Accepted,
    /// A save was requested for a frame with too few corners.
    Rejected,
    /// The target number of images was saved.
    Done,
    /// The user cancelled.
    Cancelled,
}

impl CaptureState {
    /// Whether the session has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Done | CaptureState::Cancelled)
    }
}

/// Result of a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    /// `Done` or `Cancelled`.
    pub state: CaptureState,
    /// Images written during the session, in order.
    pub saved: Vec<PathBuf>,
    /// Number of frames read from the source.
    pub frames_seen: usize,
}

/// Capture calibration images until the target count is saved or the user cancels.
///
/// Each frame is searched for the board; pressing SPACE saves the frame when
/// enough corners were found and ESC ends the session. The k-th save of a
/// session goes to `img_calib_<k>.png`, replacing an image of an earlier
/// session. Saved images are the raw frames, without overlays. Detection
/// and preview failures are logged and never end the session.
pub fn run_capture(
    config: &AppConfig,
    board: &CharucoBoard,
    backend: &mut impl VisionBackend,
    frames: &mut dyn FrameSource,
    keys: &mut dyn KeySource,
    preview: &mut dyn Preview,
) -> Result<CaptureOutcome, CaptureError> {
    let capture = &config.capture;
    let mut images = ImageSet::open_or_create(config.image_dir())?;
    let poll_timeout = Duration::from_millis(capture.key_poll_ms);

    if !images.is_empty() {
        log::warn!(
            "{} already holds {} images, new images replace them from {}",
            images.dir().display(),
            images.len(),
            file_name(0)
        );
    }
    log::info!(
        "capturing {} images into {}, SPACE to save, ESC to quit",
        capture.target_count,
        images.dir().display()
    );

    let mut state = CaptureState::AwaitingFrame;
    let mut saved = Vec::new();
    let mut frames_seen = 0;
    let mut preview_enabled = true;
    let mut gray: GrayImage = Image::from_size_val([0, 0].into(), 0);

    while !state.is_terminal() {
        state = CaptureState::AwaitingFrame;
        let frame = frames.read_frame()?;

        let mut markers = Vec::new();
        let mut corners = CharucoCorners::default();
        let mut failure = None;
        if let Some(frame) = &frame {
            frames_seen += 1;
            state = CaptureState::Detecting;

            if gray.size() != frame.size() {
                gray = Image::from_size_val(frame.size(), 0);
            }
            gray_from_rgb_u8(frame, &mut gray)?;

            match find_board(backend, &gray, board) {
                Ok(found) => (markers, corners) = found,
                Err(e) => {
                    log::debug!("detection failed on frame {frames_seen}: {e}");
                    failure = Some(e);
                }
            }
        }
        let savable = corners.len() >= capture.min_save_corners;

        if let (Some(frame), true) = (&frame, preview_enabled) {
            let status = if let Some(e) = &failure {
                format!("detection failed: {e}")
            } else if markers.is_empty() {
                "no markers".to_string()
            } else if savable {
                format!("{} markers, {} corners, SPACE to save", markers.len(), corners.len())
            } else {
                format!("{} markers, {} corners, not enough corners", markers.len(), corners.len())
            };
            let shown = preview.show(&FrameOverlay {
                frame,
                markers: &markers,
                corners: &corners,
                saved: saved.len(),
                target: capture.target_count,
                status: &status,
            });
            if let Err(e) = shown {
                log::warn!("{e}, continuing without preview");
                preview_enabled = false;
            }
        }

        match keys.poll_key(poll_timeout)? {
            Some(Key::Escape) => {
                log::info!("capture cancelled after {} images", saved.len());
                state = CaptureState::Cancelled;
            }
            Some(Key::Space) => match &frame {
                Some(frame) if savable => {
                    let index = saved.len();
                    let path = images.path_for(index);
                    write_image_png_rgb8(&path, frame)?;
                    images.insert(index);
                    log::info!(
                        "saved {} ({} corners), {}/{}",
                        path.display(),
                        corners.len(),
                        index + 1,
                        capture.target_count
                    );
                    saved.push(path);
                    state = CaptureState::Accepted;
                }
                _ => {
                    log::warn!(
                        "not saved: {} corners found, {} needed",
                        corners.len(),
                        capture.min_save_corners
                    );
                    state = CaptureState::Rejected;
                }
            },
            Some(Key::Other) | None => {}
        }

        if saved.len() >= capture.target_count {
            state = CaptureState::Done;
        }
    }

    Ok(CaptureOutcome {
        state,
        saved,
        frames_seen,
    })
}
