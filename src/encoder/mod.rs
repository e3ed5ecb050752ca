//! # Video Encoding Module
//!
//! Converts the ordered frame list into a silent video container: fixed-size
//! ARGB pixel-buffer conversion, readiness-paced sequential appends, and the
//! ffmpeg-backed writer sink.

pub mod pixel;
pub mod settings;
pub mod sink;
pub mod writer;

pub use pixel::PixelBuffer;
pub use settings::{MediaTime, VideoSettings};
pub use sink::{is_ffmpeg_available, FfmpegSink, FrameSink};
pub use writer::{EncodedVideo, VideoEncoder};
