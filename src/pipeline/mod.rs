//! # Pipeline Driver
//!
//! The run-level driver: loads pairs, sequences frames, encodes the silent
//! video, muxes the music track, and reports progress. One driver run yields
//! exactly one result; there is no partial-success state.

pub mod engine;
pub mod progress;

// Re-exports for convenience
pub use engine::CompositionEngine;
pub use progress::{ProgressCallback, ProgressReporter};
