use std::cmp::Ordering;
use std::fmt;

use crate::error::EncodeError;
use crate::frame::Frame;

/// Rational media time: `value / timescale` seconds
///
/// Used both for the fixed frame duration and for presentation timestamps.
/// The observed configuration presents every frame for 4 one-second units.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MediaTime {
    pub value: i64,
    pub timescale: i32,
}

impl MediaTime {
    pub const fn new(value: i64, timescale: i32) -> Self {
        Self { value, timescale }
    }

    /// Time zero in the given timescale
    pub const fn zero(timescale: i32) -> Self {
        Self {
            value: 0,
            timescale,
        }
    }

    /// This duration repeated `count` times, same timescale
    pub fn scaled(&self, count: i64) -> MediaTime {
        MediaTime::new(self.value * count, self.timescale)
    }

    pub fn as_seconds(&self) -> f64 {
        self.value as f64 / self.timescale as f64
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cross-multiplied comparison keeps mixed timescales exact
        let lhs = self.value as i128 * other.timescale as i128;
        let rhs = other.value as i128 * self.timescale as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.timescale)
    }
}

/// Output video track settings, derived once from the first frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSettings {
    pub codec: String,
    pub width: u32,
    pub height: u32,
}

impl VideoSettings {
    /// Validate and build settings for the given codec and dimensions
    ///
    /// The encoder requires the width to be divisible by 16; yuv420p output
    /// additionally needs an even height. Either violation is an error rather
    /// than a silently corrupt container.
    pub fn new(codec: &str, width: u32, height: u32) -> Result<Self, EncodeError> {
        if width % 16 != 0 {
            return Err(EncodeError::UnalignedWidth { width });
        }
        if height % 2 != 0 {
            return Err(EncodeError::OddHeight { height });
        }

        Ok(Self {
            codec: codec.to_string(),
            width,
            height,
        })
    }

    /// Derive settings from the first frame's pixel dimensions
    pub fn for_frame(frame: &Frame, codec: &str) -> Result<Self, EncodeError> {
        Self::new(codec, frame.width(), frame.height())
    }

    /// Byte length of one ARGB pixel buffer at these dimensions
    pub fn frame_byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_time_seconds_and_scaling() {
        let frame_duration = MediaTime::new(4, 1);
        assert_eq!(frame_duration.as_seconds(), 4.0);
        assert_eq!(frame_duration.scaled(3), MediaTime::new(12, 1));
        assert_eq!(MediaTime::zero(1).as_seconds(), 0.0);
    }

    #[test]
    fn media_time_ordering_across_timescales() {
        assert!(MediaTime::new(1, 2) < MediaTime::new(3, 4));
        assert_eq!(
            MediaTime::new(2, 4).cmp(&MediaTime::new(1, 2)),
            Ordering::Equal
        );
        assert!(MediaTime::new(5, 1) > MediaTime::new(9, 2));
    }

    #[test]
    fn media_time_displays_as_fraction() {
        assert_eq!(MediaTime::new(4, 1).to_string(), "4/1");
    }

    #[test]
    fn width_must_be_divisible_by_16() {
        assert!(matches!(
            VideoSettings::new("h264", 641, 480),
            Err(EncodeError::UnalignedWidth { width: 641 })
        ));
        assert!(VideoSettings::new("h264", 640, 480).is_ok());
    }

    #[test]
    fn height_must_be_even() {
        assert!(matches!(
            VideoSettings::new("h264", 640, 481),
            Err(EncodeError::OddHeight { height: 481 })
        ));
    }

    #[test]
    fn settings_derive_from_first_frame() {
        let frame = Frame::new_filled(640, 480, [0, 0, 0]);
        let settings = VideoSettings::for_frame(&frame, "h264").unwrap();
        assert_eq!((settings.width, settings.height), (640, 480));
        assert_eq!(settings.frame_byte_len(), 640 * 480 * 4);
    }
}
