use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{AudioError, Result};

/// Basic properties of the music asset
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub format: String,
}

/// Lightweight audio asset inspector
///
/// Validates the music file before the export starts and reports its
/// duration so the pipeline can log when the music is shorter than the
/// video. WAV headers are read directly; everything else goes through a
/// Symphonia format probe.
pub struct AudioProbe;

impl AudioProbe {
    /// Probe an audio asset for duration and stream parameters
    pub async fn probe<P: AsRef<Path>>(path: P) -> Result<AudioInfo> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" => Self::probe_wav(path),
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::probe_with_symphonia(path),
            _ => Err(AudioError::UnsupportedFormat { format: extension }.into()),
        }
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }

    /// WAV duration straight from the header (no sample decode)
    fn probe_wav(path: &Path) -> Result<AudioInfo> {
        let reader = hound::WavReader::open(path).map_err(|_| AudioError::ProbeFailed {
            path: path.display().to_string(),
        })?;

        let spec = reader.spec();
        let duration = reader.duration() as f64 / spec.sample_rate as f64;

        Ok(AudioInfo {
            duration,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            format: "wav".to_string(),
        })
    }

    /// Probe compressed formats with Symphonia
    ///
    /// Uses the container's frame count when it is declared; otherwise walks
    /// the packets and sums their durations.
    fn probe_with_symphonia(path: &Path) -> Result<AudioInfo> {
        let file = File::open(path).map_err(|_| AudioError::ProbeFailed {
            path: path.display().to_string(),
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|_| AudioError::ProbeFailed {
                path: path.display().to_string(),
            })?;

        let mut format = probed.format;

        // Copy the needed parameters out before the packet walk takes a
        // mutable borrow of the reader
        let (track_id, sample_rate, channels, n_frames, time_base) = {
            let track = format
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
                .ok_or_else(|| AudioError::NoAudioTrack {
                    path: path.display().to_string(),
                })?;

            let params = &track.codec_params;
            let sample_rate = params.sample_rate.ok_or_else(|| AudioError::ProbeFailed {
                path: path.display().to_string(),
            })?;
            let channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);

            (
                track.id,
                sample_rate,
                channels,
                params.n_frames,
                params.time_base,
            )
        };

        let format_name = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("unknown")
            .to_lowercase();

        if let Some(n_frames) = n_frames {
            return Ok(AudioInfo {
                duration: n_frames as f64 / sample_rate as f64,
                sample_rate,
                channels,
                format: format_name,
            });
        }

        let mut total_dur: u64 = 0;

        while let Ok(packet) = format.next_packet() {
            if packet.track_id() != track_id {
                continue;
            }
            total_dur = total_dur.saturating_add(packet.dur());
        }

        let duration = match time_base {
            Some(tb) => {
                let time = tb.calc_time(total_dur);
                time.seconds as f64 + time.frac
            }
            None => total_dur as f64 / sample_rate as f64,
        };

        Ok(AudioInfo {
            duration,
            sample_rate,
            channels,
            format: format_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_wav(path: &Path, seconds: u32, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(seconds * sample_rate) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn wav_probe_reads_duration_from_the_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("music.wav");
        write_wav(&path, 3, 8000);

        let info = AudioProbe::probe(&path).await.unwrap();
        assert!((info.duration - 3.0).abs() < 1e-9);
        assert_eq!(info.sample_rate, 8000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.format, "wav");
    }

    #[tokio::test]
    async fn unsupported_extension_is_an_error() {
        let result = AudioProbe::probe("music.xyz").await;
        assert!(result.is_err());
    }

    #[test]
    fn format_support_matches_the_probe_paths() {
        assert!(AudioProbe::is_format_supported("wav"));
        assert!(AudioProbe::is_format_supported("AAC"));
        assert!(!AudioProbe::is_format_supported("mid"));
    }
}
