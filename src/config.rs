use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    encoder::MediaTime,
    error::{ConfigError, Result},
};

/// Main configuration for the Segue-Compositor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Output video settings
    pub video: VideoConfig,

    /// Writer backend settings
    pub encoder: EncoderConfig,

    /// Audio mux/export settings
    pub mux: MuxConfig,

    /// Pipeline driver settings
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video: VideoConfig::default(),
            encoder: EncoderConfig::default(),
            mux: MuxConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|_| ConfigError::ParseFailed {
            path: path.display().to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.encoder.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// Output video configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Video codec id for the output track
    pub codec: String,

    /// Fixed presentation duration of every frame
    pub frame_duration: MediaTime,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: "h264".to_string(),
            // Four one-second units per frame
            frame_duration: MediaTime::new(4, 1),
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if !matches!(self.codec.as_str(), "h264" | "h265" | "hevc") {
            return Err(ConfigError::InvalidValue {
                key: "video.codec".to_string(),
                value: self.codec.clone(),
            }
            .into());
        }

        if self.frame_duration.value <= 0 || self.frame_duration.timescale <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.frame_duration".to_string(),
                value: self.frame_duration.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Writer backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Number of in-flight frames between the append loop and the pipe
    pub queue_capacity: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { queue_capacity: 4 }
    }
}

impl EncoderConfig {
    fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "encoder.queue_capacity".to_string(),
                value: self.queue_capacity.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Audio mux/export configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MuxConfig {
    /// Flip the video track horizontally during export
    pub flip_horizontal: bool,
}

/// Pipeline driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the scratch (silent) video between stages
    pub work_dir: PathBuf,

    /// Number of parallel blend threads
    pub blend_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("segue_work"),
            blend_threads: num_cpus::get(),
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.blend_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.blend_threads".to_string(),
                value: self.blend_threads.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
