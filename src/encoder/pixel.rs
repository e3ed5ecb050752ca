use crate::encoder::settings::VideoSettings;
use crate::frame::Frame;

/// Fixed-format 32-bit ARGB pixel buffer at the output dimensions
///
/// Every frame is drawn into a freshly allocated buffer of exactly
/// `settings.width x settings.height` before it reaches the writer backend,
/// so the backend only ever sees one size and one layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Draw a frame into an ARGB buffer at the settings' dimensions
    ///
    /// Frames whose dimensions differ from the settings are normalized by a
    /// high-quality resize. Returns `None` for frames that cannot be rendered
    /// at all (an empty extent); the caller skips those with a warning.
    pub fn from_frame(frame: &Frame, settings: &VideoSettings) -> Option<PixelBuffer> {
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }

        let resized;
        let source = if frame.width() != settings.width || frame.height() != settings.height {
            resized = frame.resized(settings.width, settings.height);
            &resized
        } else {
            frame
        };

        let mut data = Vec::with_capacity(settings.frame_byte_len());
        for pixel in source.as_image().pixels() {
            data.extend_from_slice(&[255, pixel[0], pixel[1], pixel[2]]);
        }

        Some(PixelBuffer {
            width: settings.width,
            height: settings.height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw ARGB bytes, row-major
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
