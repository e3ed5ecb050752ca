use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    audio::AudioProbe,
    cancel::CancelToken,
    config::Config,
    encoder::{EncodedVideo, FfmpegSink, FrameSink, VideoEncoder, VideoSettings},
    error::{CompositorError, Result, SequenceError},
    frame::{Frame, FramePair, FrameSequencer, PairLoader, PairSequence},
    muxer::{AudioMuxer, FinalVideo},
    pipeline::progress::{ProgressCallback, ProgressReporter},
};

/// Fixed scratch file name for the silent video between stages
const SCRATCH_FILE_NAME: &str = "silent_video.mp4";

/// Main engine that orchestrates the entire video creation process
///
/// The engine follows a clear pipeline:
/// 1. Pair Loading - Discover and load ordered (image, mask) pairs
/// 2. Audio Validation - Probe the music asset
/// 3. Frame Sequencing - Interleave blended transition frames
/// 4. Video Encoding - Stream frames into the silent container
/// 5. Audio Muxing - Export the final video with the music track
///
/// One engine run owns its scratch path exclusively; concurrent runs against
/// the same work directory must be serialized by the caller.
pub struct CompositionEngine {
    config: Config,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
}

impl CompositionEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            progress: None,
            cancel: CancelToken::new(),
        }
    }

    /// Attach a progress observer (invoked per prepared input item)
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Handle for cancelling this engine's encode loop
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Main composition method - loads pairs from a directory, then runs the
    /// full pipeline
    ///
    /// # Arguments
    ///
    /// * `images_dir` - Directory of numbered images with `.mask` siblings
    /// * `audio_path` - Path to the music asset (WAV, MP3, FLAC, AAC, ...)
    /// * `output_path` - Path for the final output video
    pub async fn compose<P: AsRef<Path>>(
        &self,
        images_dir: P,
        audio_path: P,
        output_path: P,
    ) -> Result<FinalVideo> {
        let images_dir = images_dir.as_ref();

        info!("Starting Segue-Compositor run");
        info!("   Images: {:?}", images_dir);
        info!("   Audio: {:?}", audio_path.as_ref());
        info!("   Output: {:?}", output_path.as_ref());

        // Pipeline Step 1: Pair Discovery and Loading
        let pairs = self.load_pairs(images_dir)?;

        self.compose_pairs(pairs, audio_path, output_path).await
    }

    /// Run the pipeline over an already-prepared ordered pair list
    ///
    /// This is the boundary for callers that produce pairs themselves (for
    /// example from a segmentation model): every pair must be complete before
    /// this is invoked.
    pub async fn compose_pairs<P: AsRef<Path>>(
        &self,
        pairs: PairSequence,
        audio_path: P,
        output_path: P,
    ) -> Result<FinalVideo> {
        let audio_path = audio_path.as_ref();
        let output_path = output_path.as_ref();

        // At least one valid pair is an explicit entry precondition
        if pairs.is_empty() {
            return Err(SequenceError::EmptyInput.into());
        }

        // Pipeline Step 2: Audio Validation
        let audio_info = self.probe_audio(audio_path).await?;

        // Pipeline Step 3: Frame Sequencing
        let frames = self.sequence_frames(pairs.pairs())?;

        let expected_duration =
            self.config.video.frame_duration.as_seconds() * frames.len() as f64;
        if audio_info.duration < expected_duration {
            warn!(
                "Music ({:.1}s) is shorter than the video ({:.1}s); the tail will be silent",
                audio_info.duration, expected_duration
            );
        }

        // Pipeline Step 4: Video Encoding
        let encoded = self.encode_frames(frames).await?;

        // Pipeline Step 5: Audio Muxing
        let final_video = self.mux_audio(&encoded, audio_path, output_path).await?;

        // The scratch file has been consumed
        if let Err(e) = std::fs::remove_file(&encoded.path) {
            warn!("Failed to remove scratch file {:?}: {}", encoded.path, e);
        }

        info!("Composition complete! Output saved to: {:?}", final_video.path);
        Ok(final_video)
    }

    // ==========================================
    // PIPELINE STEP 1: PAIR DISCOVERY & LOADING
    // ==========================================

    /// Discover and load ordered pairs, reporting progress per item
    fn load_pairs(&self, images_dir: &Path) -> Result<PairSequence> {
        info!("Step 1: Loading (image, mask) pairs...");

        let locations = PairLoader::discover(images_dir)?;
        let mut reporter = ProgressReporter::new(locations.len(), self.progress.clone());

        let mut pairs = PairSequence::new();
        for location in &locations {
            let pair = PairLoader::load(location)?;
            pairs.add_pair(pair);
            reporter.advance();
        }

        info!(
            "   Loaded {} pairs ({} with masks)",
            pairs.len(),
            pairs.iter().filter(|p| p.mask.is_some()).count()
        );

        Ok(pairs)
    }

    // ==========================================
    // PIPELINE STEP 2: AUDIO VALIDATION
    // ==========================================

    async fn probe_audio(&self, audio_path: &Path) -> Result<crate::audio::AudioInfo> {
        info!("Step 2: Probing audio asset...");

        let info = AudioProbe::probe(audio_path).await?;
        info!(
            "   Audio: {:.1}s, {} Hz, {} channels ({})",
            info.duration, info.sample_rate, info.channels, info.format
        );

        Ok(info)
    }

    // ==========================================
    // PIPELINE STEP 3: FRAME SEQUENCING
    // ==========================================

    /// Build the ordered frame list, fanning blends out across the
    /// configured thread count
    fn sequence_frames(&self, pairs: &[FramePair]) -> Result<Vec<Frame>> {
        info!("Step 3: Sequencing frames...");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pipeline.blend_threads)
            .build()
            .map_err(|e| CompositorError::generic(format!("failed to build blend pool: {}", e)))?;

        let frames = pool.install(|| FrameSequencer::build_frame_list(pairs))?;

        info!(
            "   Sequenced {} frames from {} pairs",
            frames.len(),
            pairs.len()
        );

        Ok(frames)
    }

    // ==========================================
    // PIPELINE STEP 4: VIDEO ENCODING
    // ==========================================

    /// Encode the frame list into the silent scratch container
    async fn encode_frames(&self, frames: Vec<Frame>) -> Result<EncodedVideo> {
        info!("Step 4: Encoding silent video...");

        std::fs::create_dir_all(&self.config.pipeline.work_dir)?;
        let scratch_path = self.config.pipeline.work_dir.join(SCRATCH_FILE_NAME);

        // Settings derive once from the first frame's pixel dimensions
        let settings = VideoSettings::for_frame(&frames[0], &self.config.video.codec)?;
        let frame_duration = self.config.video.frame_duration;

        debug!(
            "   Settings: {} {}x{}, frame duration {}",
            settings.codec, settings.width, settings.height, frame_duration
        );

        let sink_settings = settings.clone();
        let capacity = self.config.encoder.queue_capacity;
        let sink_path = scratch_path.clone();

        let encoder = VideoEncoder::new(settings, frame_duration);
        let encoded = match encoder
            .encode(
                frames,
                move || {
                    FfmpegSink::create(&sink_settings, frame_duration, &sink_path, capacity)
                        .map(|sink| Box::new(sink) as Box<dyn FrameSink>)
                },
                self.cancel.clone(),
            )
            .await
        {
            Ok(encoded) => encoded,
            Err(e) => {
                // A partially written container is not guaranteed valid
                let _ = std::fs::remove_file(&scratch_path);
                return Err(e.into());
            }
        };

        info!(
            "   Encoded {} frames, {:.1}s, {:.1} MB",
            encoded.frame_count,
            encoded.duration_seconds,
            encoded.file_size as f64 / 1024.0 / 1024.0
        );

        Ok(encoded)
    }

    // ==========================================
    // PIPELINE STEP 5: AUDIO MUXING
    // ==========================================

    async fn mux_audio(
        &self,
        encoded: &EncodedVideo,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<FinalVideo> {
        info!("Step 5: Muxing audio...");

        let muxer = AudioMuxer::new(self.config.mux.flip_horizontal);
        let final_video = muxer.mux(encoded, audio_path, output_path).await?;

        info!(
            "   Final video: {:?} ({:.1}s, {:.1} MB)",
            final_video.path,
            final_video.duration_seconds,
            final_video.file_size as f64 / 1024.0 / 1024.0
        );

        Ok(final_video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[tokio::test]
    async fn empty_pair_list_is_a_typed_error() {
        let engine = CompositionEngine::new(Config::default());
        let result = engine
            .compose_pairs(PairSequence::new(), "music.wav", "final_video.mp4")
            .await;

        assert!(matches!(
            result,
            Err(CompositorError::Sequence(SequenceError::EmptyInput))
        ));
    }

    #[test]
    fn loading_reports_progress_per_pair_then_done() {
        let dir = tempdir().unwrap();
        for n in 1..=3u32 {
            let image = RgbImage::from_fn(4, 4, |_, _| image::Rgb([n as u8, 0, 0]));
            image
                .save(dir.path().join(format!("{:02}_shot.png", n)))
                .unwrap();
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let engine = CompositionEngine::new(Config::default()).with_progress(Arc::new(
            move |status: &str| {
                sink.lock().unwrap().push(status.to_string());
            },
        ));

        let pairs = engine.load_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &["1 / 3".to_string(), "2 / 3".to_string(), "done".to_string()]
        );
    }

    #[test]
    fn missing_images_directory_is_an_error() {
        let engine = CompositionEngine::new(Config::default());
        let result = engine.load_pairs(Path::new("does/not/exist"));
        assert!(result.is_err());
    }
}
