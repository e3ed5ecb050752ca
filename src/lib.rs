//! # Segue-Compositor
//!
//! Turn an ordered set of segmented still images into a music-backed video.
//!
//! Each input item is an (image, mask) pair. Between every two originals the
//! pipeline inserts a transition frame — the later original composited
//! against the earlier one through its segmentation mask — then streams the
//! resulting frame list into an H.264 encoder at a fixed frame duration and
//! muxes a music track onto the silent result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segue_compositor::{config::Config, pipeline::CompositionEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = CompositionEngine::new(Config::default());
//! engine.compose(
//!     "shots/",
//!     "music.aac",
//!     "final_video.mp4"
//! ).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`frame`] - Frame types, the mask blender, the transition sequencer,
//!   and the numbered-pair loader
//! - [`encoder`] - Pixel-buffer conversion and the readiness-paced writer
//! - [`muxer`] - Audio/video export of the final container
//! - [`pipeline`] - The run-level driver and progress reporting
//! - [`audio`] - Music asset probing
//! - [`config`] - Configuration management
//!
//! ## Bringing Your Own Pairs
//!
//! The directory loader stands in for an upstream segmentation stage. If you
//! already have masks, hand the engine prepared pairs directly:
//!
//! ```rust,no_run
//! use segue_compositor::{
//!     config::Config,
//!     frame::PairSequence,
//!     pipeline::CompositionEngine,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let pairs: PairSequence = load_my_pairs();
//! let engine = CompositionEngine::new(Config::default());
//! engine.compose_pairs(pairs, "music.aac", "final_video.mp4").await?;
//! # Ok(())
//! # }
//! # fn load_my_pairs() -> segue_compositor::frame::PairSequence { PairSequence::new() }
//! ```

pub mod audio;
pub mod cancel;
pub mod config;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod muxer;
pub mod pipeline;

// Re-export commonly used types for convenience
pub use crate::{
    cancel::CancelToken,
    config::Config,
    error::{CompositorError, Result},
    frame::{FrameBlender, FrameSequencer},
    muxer::FinalVideo,
    pipeline::CompositionEngine,
};
