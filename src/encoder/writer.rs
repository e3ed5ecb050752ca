use std::path::PathBuf;

use tokio::task;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::encoder::pixel::PixelBuffer;
use crate::encoder::settings::{MediaTime, VideoSettings};
use crate::encoder::sink::FrameSink;
use crate::error::EncodeError;

/// Write-session lifecycle
///
/// `Failed` is reachable from every other state; the other transitions are
/// strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Idle,
    Writing,
    Finishing,
    Done,
    Failed,
}

/// A completed, closed, silent container file at the scratch path
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub frame_count: usize,
    pub file_size: u64,
}

/// Streams an ordered frame list into a writer backend
///
/// Appends are strictly sequential and paced by the sink's readiness signal;
/// presentation timestamps are cumulative multiples of the fixed frame
/// duration. One encoder instance drives exactly one run and owns its sink
/// for the duration of that run.
pub struct VideoEncoder {
    settings: VideoSettings,
    frame_duration: MediaTime,
}

impl VideoEncoder {
    pub fn new(settings: VideoSettings, frame_duration: MediaTime) -> Self {
        Self {
            settings,
            frame_duration,
        }
    }

    /// Encode the ordered frame list into a silent video file
    ///
    /// The append loop runs on a blocking worker so awaiting this does not
    /// stall the caller's progress reporting. `make_sink` opens the writer
    /// once the run actually starts (stale-file removal included).
    pub async fn encode<F>(
        self,
        frames: Vec<crate::frame::Frame>,
        make_sink: F,
        cancel: CancelToken,
    ) -> Result<EncodedVideo, EncodeError>
    where
        F: FnOnce() -> Result<Box<dyn FrameSink>, EncodeError> + Send + 'static,
    {
        task::spawn_blocking(move || self.encode_blocking(frames, make_sink, cancel))
            .await
            .map_err(|e| EncodeError::FinishFailed {
                reason: format!("encoder task panicked: {}", e),
            })?
    }

    /// Synchronous core of the encoder; drives the full state machine
    pub fn encode_blocking<F>(
        self,
        frames: Vec<crate::frame::Frame>,
        make_sink: F,
        cancel: CancelToken,
    ) -> Result<EncodedVideo, EncodeError>
    where
        F: FnOnce() -> Result<Box<dyn FrameSink>, EncodeError>,
    {
        let mut state = WriterState::Idle;
        debug!("Encoder run starting ({:?})", state);

        if frames.is_empty() {
            return Err(EncodeError::NoFramesAppended);
        }

        let mut sink = match make_sink() {
            Ok(sink) => sink,
            Err(e) => {
                warn!("Writer creation failed: {}", e);
                return Err(e);
            }
        };

        state = WriterState::Writing;
        debug!(
            "Write session opened ({:?}): {} frames, {}x{}, frame duration {}",
            state,
            frames.len(),
            self.settings.width,
            self.settings.height,
            self.frame_duration
        );

        let mut appended = 0usize;
        let mut skipped = 0usize;

        for (index, frame) in frames.iter().enumerate() {
            if cancel.is_cancelled() {
                state = WriterState::Failed;
                debug!("Run cancelled at frame {} ({:?})", index, state);
                return Err(EncodeError::Cancelled);
            }

            let Some(buffer) = PixelBuffer::from_frame(frame, &self.settings) else {
                warn!("Could not render frame {}; skipping it", index);
                skipped += 1;
                continue;
            };

            // Appends stay sequential: wait for the readiness signal rather
            // than buffering without bound
            sink.wait_until_ready(&cancel)?;

            let pts = self.frame_duration.scaled(appended as i64);
            sink.append(buffer, pts).map_err(|e| match e {
                EncodeError::Cancelled => EncodeError::Cancelled,
                other => EncodeError::AppendFailed {
                    index,
                    reason: other.to_string(),
                },
            })?;
            appended += 1;
        }

        if appended == 0 {
            state = WriterState::Failed;
            warn!("All {} frames failed to convert ({:?})", frames.len(), state);
            return Err(EncodeError::NoFramesAppended);
        }

        state = WriterState::Finishing;
        debug!("Marking input finished ({:?})", state);

        let path = sink.finish()?;
        state = WriterState::Done;

        let file_size = std::fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| EncodeError::FinishFailed {
                reason: format!("encoded file missing after close: {}", e),
            })?;

        info!(
            "Encoded {} frames ({} skipped) into {:?} ({:?})",
            appended, skipped, path, state
        );

        Ok(EncodedVideo {
            path,
            duration_seconds: self.frame_duration.as_seconds() * appended as f64,
            frame_count: appended,
            file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use std::sync::{Arc, Mutex};

    /// Records every sink interaction; the file it "writes" is created on
    /// finish so the encoder's metadata lookup succeeds.
    struct RecordingSink {
        events: Arc<Mutex<Vec<String>>>,
        timestamps: Arc<Mutex<Vec<MediaTime>>>,
        path: PathBuf,
    }

    impl FrameSink for RecordingSink {
        fn is_ready(&self) -> bool {
            true
        }

        fn wait_until_ready(&self, cancel: &CancelToken) -> Result<(), EncodeError> {
            if cancel.is_cancelled() {
                return Err(EncodeError::Cancelled);
            }
            self.events.lock().unwrap().push("wait".to_string());
            Ok(())
        }

        fn append(&mut self, buffer: PixelBuffer, pts: MediaTime) -> Result<(), EncodeError> {
            assert_eq!(buffer.data().len() % 4, 0);
            self.events.lock().unwrap().push("append".to_string());
            self.timestamps.lock().unwrap().push(pts);
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<PathBuf, EncodeError> {
            self.events.lock().unwrap().push("finish".to_string());
            std::fs::write(&self.path, b"container").unwrap();
            Ok(self.path.clone())
        }
    }

    fn recording_sink(
        dir: &tempfile::TempDir,
    ) -> (
        Arc<Mutex<Vec<String>>>,
        Arc<Mutex<Vec<MediaTime>>>,
        RecordingSink,
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink {
            events: Arc::clone(&events),
            timestamps: Arc::clone(&timestamps),
            path: dir.path().join("silent_video.mp4"),
        };
        (events, timestamps, sink)
    }

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::new_filled(16, 2, [i as u8, 0, 0]))
            .collect()
    }

    fn encoder() -> VideoEncoder {
        VideoEncoder::new(
            VideoSettings::new("h264", 16, 2).unwrap(),
            MediaTime::new(4, 1),
        )
    }

    #[tokio::test]
    async fn timestamps_are_cumulative_multiples_of_frame_duration() {
        let dir = tempfile::tempdir().unwrap();
        let (_, timestamps, sink) = recording_sink(&dir);

        let encoded = encoder()
            .encode(frames(5), move || Ok(Box::new(sink) as Box<dyn FrameSink>), CancelToken::new())
            .await
            .unwrap();

        let pts: Vec<i64> = timestamps.lock().unwrap().iter().map(|t| t.value).collect();
        assert_eq!(pts, vec![0, 4, 8, 12, 16]);
        assert!(pts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(encoded.frame_count, 5);
        assert_eq!(encoded.duration_seconds, 20.0);
    }

    #[tokio::test]
    async fn every_append_is_preceded_by_a_readiness_wait() {
        let dir = tempfile::tempdir().unwrap();
        let (events, _, sink) = recording_sink(&dir);

        encoder()
            .encode(frames(3), move || Ok(Box::new(sink) as Box<dyn FrameSink>), CancelToken::new())
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            events.as_slice(),
            &["wait", "append", "wait", "append", "wait", "append", "finish"]
        );
    }

    #[tokio::test]
    async fn unrenderable_frames_are_skipped_without_timestamp_holes() {
        let dir = tempfile::tempdir().unwrap();
        let (_, timestamps, sink) = recording_sink(&dir);

        let mut list = frames(2);
        list.insert(1, Frame::new(image::RgbImage::new(0, 0)));

        let encoded = encoder()
            .encode(list, move || Ok(Box::new(sink) as Box<dyn FrameSink>), CancelToken::new())
            .await
            .unwrap();

        assert_eq!(encoded.frame_count, 2);
        let pts: Vec<i64> = timestamps.lock().unwrap().iter().map(|t| t.value).collect();
        assert_eq!(pts, vec![0, 4]);
    }

    #[tokio::test]
    async fn all_frames_unrenderable_is_an_explicit_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (_, _, sink) = recording_sink(&dir);

        let list = vec![
            Frame::new(image::RgbImage::new(0, 0)),
            Frame::new(image::RgbImage::new(0, 0)),
        ];
        let result = encoder()
            .encode(list, move || Ok(Box::new(sink) as Box<dyn FrameSink>), CancelToken::new())
            .await;

        assert!(matches!(result, Err(EncodeError::NoFramesAppended)));
    }

    #[tokio::test]
    async fn empty_frame_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_, _, sink) = recording_sink(&dir);

        let result = encoder()
            .encode(Vec::new(), move || Ok(Box::new(sink) as Box<dyn FrameSink>), CancelToken::new())
            .await;
        assert!(matches!(result, Err(EncodeError::NoFramesAppended)));
    }

    #[tokio::test]
    async fn cancellation_stops_the_frame_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (events, _, sink) = recording_sink(&dir);

        let cancel = CancelToken::new();
        cancel.cancel();

        let result = encoder()
            .encode(frames(3), move || Ok(Box::new(sink) as Box<dyn FrameSink>), cancel)
            .await;

        assert!(matches!(result, Err(EncodeError::Cancelled)));
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sequenced_pairs_encode_with_expected_timestamps() {
        use crate::frame::{FramePair, FrameSequencer, MaskFrame};

        let dir = tempfile::tempdir().unwrap();
        let (_, timestamps, sink) = recording_sink(&dir);

        // Three same-size pairs whose masks always satisfy the blend
        // preconditions yield orig0, blend1, orig1, blend2, orig2
        let pairs: Vec<FramePair> = (1..=3u32)
            .map(|n| {
                FramePair::new(
                    format!("{:02}_shot.png", n),
                    n,
                    format!("shot{}", n),
                    Frame::new_filled(640, 480, [n as u8 * 40, 0, 0]),
                    Some(MaskFrame::new_filled(640, 480, 128)),
                )
            })
            .collect();

        let frames = FrameSequencer::build_frame_list(&pairs).unwrap();
        assert_eq!(frames.len(), 5);

        let settings = VideoSettings::new("h264", 640, 480).unwrap();
        let encoded = VideoEncoder::new(settings, MediaTime::new(4, 1))
            .encode(frames, move || Ok(Box::new(sink) as Box<dyn FrameSink>), CancelToken::new())
            .await
            .unwrap();

        assert_eq!(encoded.frame_count, 5);
        assert_eq!(encoded.duration_seconds, 20.0);
        let pts: Vec<i64> = timestamps.lock().unwrap().iter().map(|t| t.value).collect();
        assert_eq!(pts, vec![0, 4, 8, 12, 16]);
    }

    #[tokio::test]
    async fn writer_creation_failure_propagates() {
        let result = encoder()
            .encode(
                frames(1),
                move || {
                    Err(EncodeError::WriterCreateFailed {
                        path: "scratch.mp4".to_string(),
                        reason: "disk full".to_string(),
                    })
                },
                CancelToken::new(),
            )
            .await;

        assert!(matches!(result, Err(EncodeError::WriterCreateFailed { .. })));
    }
}
