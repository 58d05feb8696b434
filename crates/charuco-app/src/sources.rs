use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::{
    capture::{FrameSource, Key, KeySource},
    config::CameraConfig,
    error::CaptureError,
};

/// Frames from `/dev/video<k>`. The device is released on drop.
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub struct V4lFrameSource {
    camera: charuco_io::v4l::V4lCamera,
}

#[cfg(all(feature = "v4l", target_os = "linux"))]
impl FrameSource for V4lFrameSource {
    fn read_frame(&mut self) -> Result<Option<charuco_image::RgbImage>, CaptureError> {
        Ok(self.camera.grab_rgb8()?)
    }
}

/// Open the configured camera.
///
/// # Errors
///
/// [`CaptureError::DeviceUnavailable`] when the device cannot be opened or
/// the tool was built without camera support.
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub fn open_camera(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CaptureError> {
    use charuco_io::v4l::{V4lCamera, V4lCameraConfig};

    let camera_config = V4lCameraConfig {
        device_index: config.device,
        size: [config.width, config.height].into(),
        timeout: Duration::from_millis(config.timeout_ms),
        ..Default::default()
    };
    let camera = V4lCamera::new(&camera_config)
        .map_err(|e| CaptureError::DeviceUnavailable(config.device, e.to_string()))?;
    log::info!(
        "opened /dev/video{} at {}x{}",
        config.device,
        camera.size().width,
        camera.size().height
    );
    Ok(Box::new(V4lFrameSource { camera }))
}

/// Open the configured camera.
///
/// Always fails with [`CaptureError::DeviceUnavailable`]: this build has no
/// camera support.
#[cfg(not(all(feature = "v4l", target_os = "linux")))]
pub fn open_camera(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CaptureError> {
    Err(CaptureError::DeviceUnavailable(
        config.device,
        "built without camera support, enable the `v4l` feature".to_string(),
    ))
}

/// Key presses from the terminal.
///
/// Puts the terminal in raw mode for its lifetime so that single key presses
/// arrive without ENTER.
pub struct TerminalKeys {
    _guard: RawModeGuard,
}

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            log::error!("failed to restore the terminal: {e}");
        }
    }
}

impl TerminalKeys {
    /// Switch the terminal to raw mode.
    pub fn new() -> Result<Self, CaptureError> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self {
            _guard: RawModeGuard,
        })
    }
}

impl KeySource for TerminalKeys {
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>, CaptureError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(None);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        let key = match key.code {
            KeyCode::Esc => Key::Escape,
            // raw mode swallows SIGINT
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Escape,
            KeyCode::Char(' ') => Key::Space,
            _ => Key::Other,
        };
        Ok(Some(key))
    }
}
