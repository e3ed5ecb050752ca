use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tokio::task;
use tracing::{debug, info};

use crate::encoder::EncodedVideo;
use crate::error::{MuxError, Result};

/// The final muxed video+audio container at the stable output path
#[derive(Debug, Clone)]
pub struct FinalVideo {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub file_size: u64,
}

/// Combines the silent encoded video with the music asset
///
/// The video track is copied with its orientation preserved (an optional
/// horizontal flip re-encodes through a flip filter), the music track is laid
/// in starting at time zero, and any audio track already present in the video
/// is kept as well. Everything is trimmed to the video track's duration: a
/// longer music asset is truncated, never looped. The export overwrites any
/// prior file at the output path.
pub struct AudioMuxer {
    flip_horizontal: bool,
}

impl AudioMuxer {
    pub fn new(flip_horizontal: bool) -> Self {
        Self { flip_horizontal }
    }

    /// Mux `video` and the audio asset into `output_path`
    ///
    /// Terminal outcomes are completed (the returned path), failed, and
    /// cancelled; the latter two are reported with the underlying error and
    /// are treated identically by callers. No retry happens here.
    pub async fn mux<P: AsRef<Path>>(
        &self,
        video: &EncodedVideo,
        audio_path: P,
        output_path: P,
    ) -> Result<FinalVideo> {
        let audio_path = audio_path.as_ref().to_path_buf();
        let output_path = output_path.as_ref().to_path_buf();

        if !video.path.is_file() {
            return Err(MuxError::VideoMissing {
                path: video.path.display().to_string(),
            }
            .into());
        }
        if !audio_path.is_file() {
            return Err(MuxError::AudioMissing {
                path: audio_path.display().to_string(),
            }
            .into());
        }

        let args = build_export_args(
            &video.path,
            &audio_path,
            &output_path,
            video.duration_seconds,
            self.flip_horizontal,
        );
        debug!("Export command: ffmpeg {}", args.join(" "));

        let output = task::spawn_blocking(move || {
            Command::new("ffmpeg")
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
        })
        .await
        .map_err(|e| MuxError::ExportStartFailed {
            reason: format!("export task panicked: {}", e),
        })?
        .map_err(|e| MuxError::ExportStartFailed {
            reason: format!("failed to run ffmpeg: {}", e),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        classify_exit(output.status.code(), stderr.trim())?;

        let file_size = std::fs::metadata(&output_path)
            .map(|m| m.len())
            .map_err(|e| MuxError::ExportFailed {
                reason: format!("output file missing after export: {}", e),
            })?;

        info!(
            "Export complete: {:?} ({:.1}s, {:.1} MB)",
            output_path,
            video.duration_seconds,
            file_size as f64 / 1024.0 / 1024.0
        );

        Ok(FinalVideo {
            path: output_path,
            duration_seconds: video.duration_seconds,
            file_size,
        })
    }
}

/// ffmpeg arguments for the export
///
/// Maps the video track, the music track, and — when the video carries its
/// own audio — that track too, all starting at time zero and trimmed to the
/// video track's duration via `-t`.
fn build_export_args(
    video: &Path,
    audio: &Path,
    output: &Path,
    video_duration: f64,
    flip_horizontal: bool,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        video.display().to_string(),
        "-i".into(),
        audio.display().to_string(),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-map".into(),
        "0:a?".into(),
    ];

    if flip_horizontal {
        // A filtered track cannot be stream-copied
        args.extend(["-vf".into(), "hflip".into(), "-c:v".into(), "libx264".into()]);
    } else {
        args.extend(["-c:v".into(), "copy".into()]);
    }

    args.extend([
        "-c:a".into(),
        "aac".into(),
        "-t".into(),
        format!("{:.6}", video_duration),
        "-movflags".into(),
        "+faststart".into(),
        output.display().to_string(),
    ]);

    args
}

/// Map an ffmpeg exit into the three terminal outcomes
///
/// Success is completed; a nonzero exit is failed; death by signal is
/// cancelled. Callers treat failed and cancelled identically.
fn classify_exit(code: Option<i32>, stderr: &str) -> std::result::Result<(), MuxError> {
    match code {
        Some(0) => Ok(()),
        Some(code) => Err(MuxError::ExportFailed {
            reason: format!("ffmpeg exited with status {}: {}", code, stderr),
        }),
        None => Err(MuxError::ExportCancelled {
            reason: format!("ffmpeg terminated by signal: {}", stderr),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(flip: bool) -> Vec<String> {
        build_export_args(
            Path::new("work/silent_video.mp4"),
            Path::new("assets/music.aac"),
            Path::new("out/final_video.mp4"),
            20.0,
            flip,
        )
    }

    #[test]
    fn export_maps_video_music_and_optional_video_audio() {
        let args = args(false);
        let joined = args.join(" ");
        assert!(joined.contains("-map 0:v:0"));
        assert!(joined.contains("-map 1:a:0"));
        assert!(joined.contains("-map 0:a?"));
    }

    #[test]
    fn default_export_copies_the_video_track() {
        let joined = args(false).join(" ");
        assert!(joined.contains("-c:v copy"));
        assert!(!joined.contains("hflip"));
    }

    #[test]
    fn flipped_export_reencodes_through_the_flip_filter() {
        let joined = args(true).join(" ");
        assert!(joined.contains("-vf hflip"));
        assert!(joined.contains("-c:v libx264"));
        assert!(!joined.contains("-c:v copy"));
    }

    #[test]
    fn output_is_trimmed_to_the_video_duration() {
        let joined = args(false).join(" ");
        assert!(joined.contains("-t 20.000000"));
    }

    #[test]
    fn exit_codes_map_to_terminal_outcomes() {
        assert!(classify_exit(Some(0), "").is_ok());
        assert!(matches!(
            classify_exit(Some(1), "boom"),
            Err(MuxError::ExportFailed { .. })
        ));
        assert!(matches!(
            classify_exit(None, ""),
            Err(MuxError::ExportCancelled { .. })
        ));
    }
}
