use crate::error::BlendError;
use crate::frame::types::{Frame, MaskFrame};

/// Per-pixel mask compositor
///
/// Produces an image where the mask's red channel selects between foreground
/// and background content: 255 keeps the foreground pixel, 0 replaces it with
/// the background pixel, intermediate values mix linearly. The output extent
/// is the mask extent. The operation is a pure function of its inputs and
/// performs no I/O.
pub struct FrameBlender;

impl FrameBlender {
    /// Blend `foreground` over `background` through `mask`
    ///
    /// Preconditions: the background must be present and both images must
    /// match the mask extent. A violated precondition is an error the caller
    /// is expected to degrade on (drop the transition frame), never a reason
    /// to abort a whole sequence.
    pub fn blend(
        foreground: &Frame,
        mask: &MaskFrame,
        background: Option<&Frame>,
    ) -> Result<Frame, BlendError> {
        let background = background.ok_or(BlendError::MissingBackground)?;

        let (width, height) = (mask.width(), mask.height());
        if width == 0 || height == 0 {
            return Err(BlendError::EmptyMask);
        }

        if foreground.width() != width || foreground.height() != height {
            return Err(BlendError::ForegroundMismatch {
                found_w: foreground.width(),
                found_h: foreground.height(),
                mask_w: width,
                mask_h: height,
            });
        }

        if background.width() != width || background.height() != height {
            return Err(BlendError::BackgroundMismatch {
                found_w: background.width(),
                found_h: background.height(),
                mask_w: width,
                mask_h: height,
            });
        }

        let mut output = Frame::new_filled(width, height, [0, 0, 0]);
        for y in 0..height {
            for x in 0..width {
                let select = mask.value(x, y) as u16;
                let fg = foreground.get_pixel(x, y);
                let bg = background.get_pixel(x, y);

                let mut mixed = [0u8; 3];
                for c in 0..3 {
                    mixed[c] = lerp_u8(bg[c], fg[c], select);
                }
                output.set_pixel(x, y, mixed);
            }
        }

        Ok(output)
    }
}

/// Linear interpolation between two channel values, `t` in 0..=255
fn lerp_u8(from: u8, to: u8, t: u16) -> u8 {
    let from = from as u16;
    let to = to as u16;
    // Rounded fixed-point mix: (from * (255 - t) + to * t) / 255
    (((from * (255 - t) + to * t) + 127) / 255) as u8
}
