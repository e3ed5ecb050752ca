use image::{imageops::FilterType, GrayImage, ImageBuffer, Rgb, RgbImage};
use std::path::PathBuf;

/// Represents a single raster frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// convenient methods for pixel access used by the blender and encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.buffer.get_pixel(x, y);
        [pixel[0], pixel[1], pixel[2]]
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Resize to the given dimensions with a high-quality Lanczos3 filter
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        let resized = image::imageops::resize(&self.buffer, width, height, FilterType::Lanczos3);
        Frame::new(resized)
    }
}

/// Single-channel selector mask for one frame
///
/// Holds the red channel of the source mask image. A value of 255 selects
/// the foreground, 0 selects the background, intermediate values mix.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskFrame {
    buffer: GrayImage,
}

impl MaskFrame {
    /// Create a mask from a single-channel buffer
    pub fn new(buffer: GrayImage) -> Self {
        Self { buffer }
    }

    /// Extract the red channel of an RGB image as a mask
    pub fn from_red_channel(image: &RgbImage) -> Self {
        let buffer = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            image::Luma([image.get_pixel(x, y)[0]])
        });
        Self { buffer }
    }

    /// Create a mask with every pixel set to the same selector value
    pub fn new_filled(width: u32, height: u32, value: u8) -> Self {
        let buffer = GrayImage::from_fn(width, height, |_, _| image::Luma([value]));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Selector value at the given coordinates
    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.buffer.get_pixel(x, y)[0]
    }

    /// Resize the mask to the given dimensions
    ///
    /// Masks arrive at model resolution and are stretched to their original
    /// image's size before compositing, so a smooth triangle filter is enough.
    pub fn resized(&self, width: u32, height: u32) -> MaskFrame {
        let resized = image::imageops::resize(&self.buffer, width, height, FilterType::Triangle);
        MaskFrame::new(resized)
    }
}

/// One input item: an original still image and its segmentation mask
///
/// Pairs are ordered by `sequence_number` (from filenames like
/// "01_intro.png"). The mask is optional; a pair without one simply gets no
/// transition frame in the output sequence.
#[derive(Debug, Clone)]
pub struct FramePair {
    /// Path the original image was loaded from
    pub path: PathBuf,

    /// Sequence number (from filename like "01_intro.png")
    pub sequence_number: u32,

    /// Name/identifier for the pair
    pub name: String,

    /// The original still image
    pub original: Frame,

    /// Segmentation mask, already resized to the original's dimensions
    pub mask: Option<MaskFrame>,
}

impl FramePair {
    /// Create a new pair
    pub fn new<P: Into<PathBuf>>(
        path: P,
        sequence_number: u32,
        name: String,
        original: Frame,
        mask: Option<MaskFrame>,
    ) -> Self {
        Self {
            path: path.into(),
            sequence_number,
            name,
            original,
            mask,
        }
    }

    /// Parse sequence number and name from a filename like "01_intro.png"
    pub fn parse_stem(stem: &str) -> Option<(u32, String)> {
        // Split on first underscore to get sequence number and name
        let parts: Vec<&str> = stem.splitn(2, '_').collect();
        if parts.len() != 2 {
            return None;
        }

        let sequence_number = parts[0].parse().ok()?;
        Some((sequence_number, parts[1].to_string()))
    }
}

/// Ordered collection of frame pairs, input order = presentation order
#[derive(Debug, Clone, Default)]
pub struct PairSequence {
    pairs: Vec<FramePair>,
}

impl PairSequence {
    /// Create a new empty sequence
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Add a pair, keeping the sequence sorted by sequence number
    pub fn add_pair(&mut self, pair: FramePair) {
        self.pairs.push(pair);
        self.pairs.sort_by_key(|pair| pair.sequence_number);
    }

    /// Get all pairs in sequence order
    pub fn pairs(&self) -> &[FramePair] {
        &self.pairs
    }

    /// Consume the sequence, yielding the ordered pairs
    pub fn into_pairs(self) -> Vec<FramePair> {
        self.pairs
    }

    /// Get the total number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Get pairs as an iterator
    pub fn iter(&self) -> impl Iterator<Item = &FramePair> {
        self.pairs.iter()
    }
}

impl FromIterator<FramePair> for PairSequence {
    fn from_iter<I: IntoIterator<Item = FramePair>>(iter: I) -> Self {
        let mut sequence = Self::new();
        for pair in iter {
            sequence.add_pair(pair);
        }
        sequence
    }
}
