use charuco_image::RgbImage;
use charuco_target::{CharucoCorners, Marker};

use crate::error::CaptureError;

/// What the capture loop shows for one frame.
pub struct FrameOverlay<'a> {
    /// The raw frame.
    pub frame: &'a RgbImage,
    /// Detected markers.
    pub markers: &'a [Marker],
    /// Interpolated chessboard corners.
    pub corners: &'a CharucoCorners,
    /// Images saved so far in this session.
    pub saved: usize,
    /// Images to save in total.
    pub target: usize,
    /// One line describing the detection.
    pub status: &'a str,
}

/// Live feedback during capture. Never touches the saved pixels.
pub trait Preview {
    /// Display one frame with its detections.
    fn show(&mut self, overlay: &FrameOverlay) -> Result<(), CaptureError>;
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NoPreview;

impl Preview for NoPreview {
    fn show(&mut self, _overlay: &FrameOverlay) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Reports the status line through the logger whenever it changes.
#[derive(Debug, Default)]
pub struct LogPreview {
    last: String,
}

impl Preview for LogPreview {
    fn show(&mut self, overlay: &FrameOverlay) -> Result<(), CaptureError> {
        let line = format!(
            "Saved: {}/{} | {}",
            overlay.saved, overlay.target, overlay.status
        );
        if line != self.last {
            log::info!("{line}");
            self.last = line;
        }
        Ok(())
    }
}

/// Streams frames and detections to a Rerun viewer.
#[cfg(feature = "rerun")]
pub struct RerunPreview {
    rec: rerun::RecordingStream,
}

#[cfg(feature = "rerun")]
impl RerunPreview {
    /// Spawn a viewer and connect to it.
    pub fn spawn() -> Result<Self, CaptureError> {
        let rec = rerun::RecordingStreamBuilder::new("ChArUco capture")
            .spawn()
            .map_err(|e| CaptureError::Preview(e.to_string()))?;
        Ok(Self { rec })
    }

    fn log(&self, overlay: &FrameOverlay) -> Result<(), rerun::RecordingStreamError> {
        let frame = overlay.frame;
        self.rec.log(
            "frame",
            &rerun::Image::from_elements(frame.as_slice(), frame.size().into(), rerun::ColorModel::RGB),
        )?;

        let outlines: Vec<[[f32; 2]; 5]> = overlay
            .markers
            .iter()
            .map(|m| [m.corners[0], m.corners[1], m.corners[2], m.corners[3], m.corners[0]])
            .collect();
        let labels: Vec<String> = overlay.markers.iter().map(|m| m.id.to_string()).collect();
        self.rec.log(
            "frame/markers",
            &rerun::LineStrips2D::new(outlines)
                .with_labels(labels)
                .with_colors([[0, 255, 0]]),
        )?;

        self.rec.log(
            "frame/corners",
            &rerun::Points2D::new(overlay.corners.positions.iter().copied())
                .with_colors([[255, 0, 0]])
                .with_radii([3.0]),
        )?;

        self.rec.log(
            "status",
            &rerun::TextLog::new(format!(
                "Saved: {}/{} | {}",
                overlay.saved, overlay.target, overlay.status
            )),
        )?;
        Ok(())
    }
}

#[cfg(feature = "rerun")]
impl Preview for RerunPreview {
    fn show(&mut self, overlay: &FrameOverlay) -> Result<(), CaptureError> {
        self.log(overlay)
            .map_err(|e| CaptureError::Preview(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charuco_image::Image;

    #[test]
    fn log_preview_only_reports_changes() -> Result<(), CaptureError> {
        let frame = Image::from_size_val([4, 4].into(), 0u8);
        let corners = CharucoCorners::default();
        let mut preview = LogPreview::default();

        for status in ["no markers", "no markers", "2 markers"] {
            preview.show(&FrameOverlay {
                frame: &frame,
                markers: &[],
                corners: &corners,
                saved: 1,
                target: 5,
                status,
            })?;
        }
        assert_eq!(preview.last, "Saved: 1/5 | 2 markers");
        Ok(())
    }
}
