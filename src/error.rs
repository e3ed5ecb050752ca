use thiserror::Error;

/// Main error type for the Segue-Compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Frame sequencing error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Frame blending error: {0}")]
    Blend(#[from] BlendError),

    #[error("Video encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Audio muxing error: {0}")]
    Mux(#[from] MuxError),

    #[error("Audio asset error: {0}")]
    Audio(#[from] AudioError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Sequencer-specific errors
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Input pair list is empty; at least one (image, mask) pair is required")]
    EmptyInput,

    #[error("Failed to load frame pair: {path}")]
    PairLoadFailed { path: String },

    #[error("No frame pairs found in directory: {path}")]
    NoPairsFound { path: String },
}

/// Blender-specific errors
///
/// All of these are recoverable at the sequencer level: a failed blend only
/// drops the transition frame for that index, never the original.
#[derive(Error, Debug)]
pub enum BlendError {
    #[error("Background image is missing")]
    MissingBackground,

    #[error("Foreground dimensions {found_w}x{found_h} do not match mask extent {mask_w}x{mask_h}")]
    ForegroundMismatch {
        found_w: u32,
        found_h: u32,
        mask_w: u32,
        mask_h: u32,
    },

    #[error("Background dimensions {found_w}x{found_h} do not match mask extent {mask_w}x{mask_h}")]
    BackgroundMismatch {
        found_w: u32,
        found_h: u32,
        mask_w: u32,
        mask_h: u32,
    },

    #[error("Mask extent is empty")]
    EmptyMask,
}

/// Encoder-specific errors
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Video width {width} must be divisible by 16")]
    UnalignedWidth { width: u32 },

    #[error("Video height {height} must be even for yuv420p output")]
    OddHeight { height: u32 },

    #[error("Unsupported video codec: {codec}")]
    UnsupportedCodec { codec: String },

    #[error("Failed to create writer at {path}: {reason}")]
    WriterCreateFailed { path: String, reason: String },

    #[error("Failed to append frame {index}: {reason}")]
    AppendFailed { index: usize, reason: String },

    #[error("Writer backend error: {reason}")]
    Backend { reason: String },

    #[error("Presentation timestamps must be strictly increasing (got {pts} after {last})")]
    NonMonotonicTimestamp { pts: String, last: String },

    #[error("No frame could be converted; nothing was appended")]
    NoFramesAppended,

    #[error("Writer failed to close: {reason}")]
    FinishFailed { reason: String },

    #[error("Encoding was cancelled")]
    Cancelled,
}

/// Muxer-specific errors
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("Encoded video not found at {path}")]
    VideoMissing { path: String },

    #[error("Audio asset not found at {path}")]
    AudioMissing { path: String },

    #[error("Failed to start export: {reason}")]
    ExportStartFailed { reason: String },

    #[error("Export failed: {reason}")]
    ExportFailed { reason: String },

    #[error("Export was cancelled: {reason}")]
    ExportCancelled { reason: String },
}

/// Audio-asset probing errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to read audio asset: {path}")]
    ProbeFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio asset has no decodable audio track: {path}")]
    NoAudioTrack { path: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // A missing pair file might appear on retry
            Self::Sequence(SequenceError::PairLoadFailed { .. }) => true,
            // Blend failures are compensated locally and never surface here,
            // but a caller holding one can always retry the pure function
            Self::Blend(_) => true,
            // Most other errors are permanent for the run
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Sequence(SequenceError::NoPairsFound { path }) => {
                format!(
                    "No (image, mask) pairs found in '{}'. Expected numbered images like \
                     '01_intro.png' with masks named '01_intro.mask.png'.",
                    path
                )
            }
            Self::Encode(EncodeError::UnalignedWidth { width }) => {
                format!(
                    "Video width {} is not divisible by 16. Use source images whose width \
                     is a multiple of 16.",
                    width
                )
            }
            Self::Mux(MuxError::AudioMissing { path }) => {
                format!("Could not find the audio asset '{}'.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
