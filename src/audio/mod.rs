//! # Audio Asset Module
//!
//! Probes the bundled music asset before export: format support, stream
//! parameters, and duration (used to warn when the music is shorter than the
//! video it will be trimmed against).

pub mod probe;

pub use probe::{AudioInfo, AudioProbe};
