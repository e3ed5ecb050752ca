use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SequenceError};
use crate::frame::types::{Frame, FramePair, MaskFrame};

/// Discovers and loads numbered (image, mask) pairs from a directory
///
/// Originals follow the numbered naming used for input ordering
/// ("01_intro.png", "02_beach.png", ...). The mask for an original lives next
/// to it with a `.mask` suffix before the extension ("01_intro.mask.png").
/// An original without a mask is still loaded; it just gets no transition
/// frame later.
pub struct PairLoader;

/// Filesystem location of one discovered pair
#[derive(Debug, Clone)]
pub struct PairLocation {
    pub image_path: PathBuf,
    pub mask_path: Option<PathBuf>,
    pub sequence_number: u32,
    pub name: String,
}

impl PairLoader {
    /// Discover pair locations in a directory, sorted by sequence number
    pub fn discover<P: AsRef<Path>>(directory: P) -> Result<Vec<PairLocation>> {
        let directory = directory.as_ref();

        if !directory.exists() || !directory.is_dir() {
            return Err(SequenceError::NoPairsFound {
                path: directory.display().to_string(),
            }
            .into());
        }

        let mut locations = Vec::new();

        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();

            if !path.is_file() || Self::is_hidden_file(&path) || !Self::is_supported(&path) {
                continue;
            }
            if Self::is_mask_file(&path) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((sequence_number, name)) = FramePair::parse_stem(stem) else {
                debug!("Skipping non-numbered file: {:?}", path);
                continue;
            };

            let mask_path = Self::find_mask(&path);
            if mask_path.is_none() {
                warn!("No mask found for '{}'; transition frame will be skipped", name);
            }

            locations.push(PairLocation {
                image_path: path,
                mask_path,
                sequence_number,
                name,
            });
        }

        if locations.is_empty() {
            return Err(SequenceError::NoPairsFound {
                path: directory.display().to_string(),
            }
            .into());
        }

        locations.sort_by_key(|location| location.sequence_number);

        info!("Discovered {} pairs in {:?}", locations.len(), directory);
        Ok(locations)
    }

    /// Load one discovered pair, resizing its mask to the original's extent
    pub fn load(location: &PairLocation) -> Result<FramePair> {
        let image = image::open(&location.image_path).map_err(|_| SequenceError::PairLoadFailed {
            path: location.image_path.display().to_string(),
        })?;
        let original = Frame::new(image.to_rgb8());

        let mask = match &location.mask_path {
            Some(mask_path) => {
                let mask_image =
                    image::open(mask_path).map_err(|_| SequenceError::PairLoadFailed {
                        path: mask_path.display().to_string(),
                    })?;
                let mask = MaskFrame::from_red_channel(&mask_image.to_rgb8());

                // Masks come out of the model at its own resolution; stretch
                // to the photo size so pair dimensions always agree.
                let mask = if mask.width() != original.width() || mask.height() != original.height()
                {
                    mask.resized(original.width(), original.height())
                } else {
                    mask
                };
                Some(mask)
            }
            None => None,
        };

        debug!(
            "Loaded pair {:02} '{}' ({}x{}, mask: {})",
            location.sequence_number,
            location.name,
            original.width(),
            original.height(),
            if mask.is_some() { "yes" } else { "no" }
        );

        Ok(FramePair::new(
            &location.image_path,
            location.sequence_number,
            location.name.clone(),
            original,
            mask,
        ))
    }

    /// Mask path for an original, if a sibling `.mask` file exists
    fn find_mask(image_path: &Path) -> Option<PathBuf> {
        let stem = image_path.file_stem()?.to_str()?;
        let parent = image_path.parent()?;

        for ext in ["png", "jpg", "jpeg"] {
            let candidate = parent.join(format!("{}.mask.{}", stem, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    fn is_mask_file(path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|stem| stem.ends_with(".mask"))
            .unwrap_or(false)
    }

    fn is_supported(path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => matches!(ext.to_lowercase().as_str(), "png" | "jpg" | "jpeg"),
            None => false,
        }
    }

    fn is_hidden_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
        let image = RgbImage::from_fn(width, height, |_, _| image::Rgb(color));
        image.save(path).unwrap();
    }

    #[test]
    fn discover_orders_by_sequence_number_and_finds_masks() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("02_beach.png"), 4, 4, [0, 255, 0]);
        write_png(&dir.path().join("01_intro.png"), 4, 4, [255, 0, 0]);
        write_png(&dir.path().join("01_intro.mask.png"), 4, 4, [255, 255, 255]);

        let locations = PairLoader::discover(dir.path()).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].sequence_number, 1);
        assert!(locations[0].mask_path.is_some());
        assert_eq!(locations[1].sequence_number, 2);
        assert!(locations[1].mask_path.is_none());
    }

    #[test]
    fn discover_skips_mask_and_unnumbered_files() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("01_only.png"), 4, 4, [1, 2, 3]);
        write_png(&dir.path().join("01_only.mask.png"), 4, 4, [255, 0, 0]);
        write_png(&dir.path().join("notes.png"), 4, 4, [9, 9, 9]);

        let locations = PairLoader::discover(dir.path()).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].name, "only");
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = PairLoader::discover(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn load_resizes_mask_to_original_extent() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("01_shot.png"), 8, 6, [10, 20, 30]);
        // Model-resolution mask, smaller than the photo
        write_png(&dir.path().join("01_shot.mask.png"), 4, 3, [255, 0, 0]);

        let locations = PairLoader::discover(dir.path()).unwrap();
        let pair = PairLoader::load(&locations[0]).unwrap();

        let mask = pair.mask.unwrap();
        assert_eq!((mask.width(), mask.height()), (8, 6));
        assert_eq!(mask.value(0, 0), 255);
    }
}
