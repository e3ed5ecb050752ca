use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::SequenceError;
use crate::frame::blender::FrameBlender;
use crate::frame::types::{Frame, FramePair};

/// Builds the ordered frame list for encoding
///
/// The first pair contributes its original image only. Every later pair
/// contributes a blended transition frame (its original composited against
/// the previous original through its mask) followed by its original. A pair
/// whose blend preconditions are not met contributes its original alone, so
/// the output always holds between `n` and `2n - 1` frames for `n` pairs.
pub struct FrameSequencer;

impl FrameSequencer {
    /// Turn the ordered pair list into the final ordered frame list
    ///
    /// Blends are pure per-pair work and run in parallel; assembly is strictly
    /// input order. Empty input is rejected here once so downstream stages can
    /// rely on at least one frame existing.
    pub fn build_frame_list(pairs: &[FramePair]) -> Result<Vec<Frame>, SequenceError> {
        if pairs.is_empty() {
            return Err(SequenceError::EmptyInput);
        }

        // Transition frame for index i > 0, or None when preconditions fail
        let transitions: Vec<Option<Frame>> = (1..pairs.len())
            .into_par_iter()
            .map(|i| Self::transition_frame(pairs, i))
            .collect();

        let mut frames = Vec::with_capacity(pairs.len() * 2 - 1);
        frames.push(pairs[0].original.clone());

        for (i, pair) in pairs.iter().enumerate().skip(1) {
            if let Some(blended) = transitions[i - 1].clone() {
                frames.push(blended);
            }
            frames.push(pair.original.clone());
        }

        debug!(
            "Sequenced {} frames from {} pairs ({} transitions)",
            frames.len(),
            pairs.len(),
            frames.len() - pairs.len()
        );

        Ok(frames)
    }

    fn transition_frame(pairs: &[FramePair], i: usize) -> Option<Frame> {
        let pair = &pairs[i];
        let background = pairs.get(i - 1).map(|p| &p.original);

        let Some(mask) = pair.mask.as_ref() else {
            debug!("Pair '{}' has no mask; skipping transition frame", pair.name);
            return None;
        };

        match FrameBlender::blend(&pair.original, mask, background) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!(
                    "Blend failed for pair '{}' ({}); keeping original only",
                    pair.name, e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::types::MaskFrame;

    fn pair(n: u32, color: [u8; 3], mask: Option<MaskFrame>) -> FramePair {
        FramePair::new(
            format!("{:02}_img.png", n),
            n,
            format!("img{}", n),
            Frame::new_filled(4, 4, color),
            mask,
        )
    }

    fn full_mask() -> MaskFrame {
        MaskFrame::new_filled(4, 4, 128)
    }

    #[test]
    fn empty_input_is_rejected() {
        let result = FrameSequencer::build_frame_list(&[]);
        assert!(matches!(result, Err(SequenceError::EmptyInput)));
    }

    #[test]
    fn single_pair_yields_its_original_only() {
        let pairs = vec![pair(1, [10, 10, 10], Some(full_mask()))];
        let frames = FrameSequencer::build_frame_list(&pairs).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], pairs[0].original);
    }

    #[test]
    fn three_pairs_with_masks_yield_five_frames() {
        let pairs = vec![
            pair(1, [10, 0, 0], Some(full_mask())),
            pair(2, [0, 10, 0], Some(full_mask())),
            pair(3, [0, 0, 10], Some(full_mask())),
        ];
        let frames = FrameSequencer::build_frame_list(&pairs).unwrap();

        // orig0, blend1, orig1, blend2, orig2
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0], pairs[0].original);
        assert_eq!(frames[2], pairs[1].original);
        assert_eq!(frames[4], pairs[2].original);
        assert_ne!(frames[1], pairs[1].original);
        assert_ne!(frames[3], pairs[2].original);
    }

    #[test]
    fn missing_mask_skips_only_that_transition() {
        let pairs = vec![
            pair(1, [10, 0, 0], Some(full_mask())),
            pair(2, [0, 10, 0], None),
            pair(3, [0, 0, 10], Some(full_mask())),
        ];
        let frames = FrameSequencer::build_frame_list(&pairs).unwrap();

        // orig0, orig1, blend2, orig2
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], pairs[0].original);
        assert_eq!(frames[1], pairs[1].original);
        assert_eq!(frames[3], pairs[2].original);
    }

    #[test]
    fn blend_failure_never_drops_originals() {
        // Mismatched dimensions make every blend fail
        let odd = FramePair::new(
            "02_odd.png",
            2,
            "odd".to_string(),
            Frame::new_filled(8, 8, [0, 10, 0]),
            Some(MaskFrame::new_filled(8, 8, 200)),
        );
        let pairs = vec![pair(1, [10, 0, 0], Some(full_mask())), odd];

        let frames = FrameSequencer::build_frame_list(&pairs).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], pairs[0].original);
        assert_eq!(frames[1], pairs[1].original);
    }

    #[test]
    fn output_length_is_bounded() {
        for n in 1..6usize {
            let pairs: Vec<FramePair> = (1..=n as u32)
                .map(|i| pair(i, [i as u8, 0, 0], Some(full_mask())))
                .collect();
            let frames = FrameSequencer::build_frame_list(&pairs).unwrap();
            assert!(frames.len() >= n && frames.len() <= 2 * n - 1);
            assert_eq!(frames[0], pairs[0].original);
        }
    }
}
