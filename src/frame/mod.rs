//! # Frame Pipeline Module
//!
//! Raster frame types, the mask blender, the transition sequencer, and the
//! numbered-pair directory loader.

pub mod blender;
pub mod loader;
pub mod sequencer;
pub mod types;

pub use blender::FrameBlender;
pub use loader::{PairLoader, PairLocation};
pub use sequencer::FrameSequencer;
pub use types::{Frame, FramePair, MaskFrame, PairSequence};
