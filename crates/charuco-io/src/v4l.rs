use std::time::Duration;

use charuco_image::{color::convert_yuyv_to_rgb_u8, Image, ImageSize};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::{error::IoError, jpeg::decode_image_jpeg_rgb8};

/// Pixel formats the camera wrapper can convert to RGB8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed YUV 4:2:2.
    Yuyv,
    /// Motion JPEG.
    Mjpg,
}

impl PixelFormat {
    fn to_fourcc(self) -> FourCC {
        match self {
            PixelFormat::Yuyv => FourCC::new(b"YUYV"),
            PixelFormat::Mjpg => FourCC::new(b"MJPG"),
        }
    }

    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"MJPG" => Some(PixelFormat::Mjpg),
            _ => None,
        }
    }
}

/// Configuration for V4L video capture.
#[derive(Clone, Debug)]
pub struct V4lCameraConfig {
    /// Index `k` of the device `/dev/video<k>`.
    pub device_index: usize,
    /// The desired image size.
    pub size: ImageSize,
    /// The preferred pixel format.
    pub format: PixelFormat,
    /// Maximum time to block waiting for a frame.
    pub timeout: Duration,
}

impl Default for V4lCameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            size: ImageSize {
                width: 640,
                height: 480,
            },
            format: PixelFormat::Yuyv,
            timeout: Duration::from_secs(2),
        }
    }
}

/// A V4L2 camera delivering RGB8 frames.
///
/// The device is released when the value is dropped.
pub struct V4lCamera {
    stream: Stream<'static>,
    format: PixelFormat,
    size: ImageSize,
    _device: Device,
}

impl V4lCamera {
    /// Open the device and start streaming.
    pub fn new(config: &V4lCameraConfig) -> Result<Self, IoError> {
        let device = Device::new(config.device_index)?;

        let mut format = device.format()?;
        format.width = config.size.width as u32;
        format.height = config.size.height as u32;
        format.fourcc = config.format.to_fourcc();
        device.set_format(&format)?;

        // the driver may pick another format or size
        let actual = device.format()?;
        let pixel_format = PixelFormat::from_fourcc(actual.fourcc)
            .ok_or_else(|| IoError::UnsupportedPixelFormat(actual.fourcc.to_string()))?;
        if pixel_format != config.format {
            log::warn!(
                "requested {:?} not supported, using {:?}",
                config.format,
                pixel_format
            );
        }

        let size = ImageSize {
            width: actual.width as usize,
            height: actual.height as usize,
        };

        let mut stream = Stream::with_buffers(&device, Type::VideoCapture, 4)?;
        stream.set_timeout(config.timeout);

        log::info!(
            "opened /dev/video{} at {}x{} ({:?})",
            config.device_index,
            size.width,
            size.height,
            pixel_format
        );

        Ok(Self {
            stream,
            format: pixel_format,
            size,
            _device: device,
        })
    }

    /// The negotiated frame size.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Grab the next frame, or `None` when the read timed out.
    pub fn grab_rgb8(&mut self) -> Result<Option<Image<u8, 3>>, IoError> {
        let (buffer, metadata) = match self.stream.next() {
            Ok(frame) => frame,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(None),
            Err(e) => return Err(IoError::CameraError(e.to_string())),
        };

        let used = (metadata.bytesused as usize).min(buffer.len());
        let data = if used > 0 { &buffer[..used] } else { buffer };

        let image = match self.format {
            PixelFormat::Yuyv => {
                let expected = self.size.width * self.size.height * 2;
                let yuyv = data.get(..expected).ok_or_else(|| {
                    IoError::CameraError(format!("short frame: {} < {expected}", data.len()))
                })?;
                let mut rgb = Image::from_size_val(self.size, 0u8);
                convert_yuyv_to_rgb_u8(yuyv, &mut rgb)?;
                rgb
            }
            PixelFormat::Mjpg => decode_image_jpeg_rgb8(data)?,
        };

        Ok(Some(image))
    }
}
