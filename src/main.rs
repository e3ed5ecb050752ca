use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

use segue_compositor::{config::Config, pipeline::CompositionEngine};

#[derive(Parser)]
#[command(
    name = "segue-compositor",
    version,
    about = "Turn segmented still images into a music-backed transition video",
    long_about = "Segue-Compositor builds a video from an ordered set of (image, mask) pairs: \
                  every pair after the first contributes a mask-blended transition frame \
                  against its predecessor, the frame list is encoded at a fixed frame \
                  duration, and a music track is muxed onto the result."
)]
struct Cli {
    /// Directory of numbered images (01_intro.png) with .mask siblings
    #[arg(short, long)]
    images: PathBuf,

    /// Music asset to lay under the video (WAV, MP3, FLAC, AAC)
    #[arg(short, long)]
    audio: PathBuf,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Flip the video horizontally during export
    #[arg(long)]
    flip: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Segue-Compositor v{}", env!("CARGO_PKG_VERSION"));
    info!("Images: {:?}", cli.images);
    info!("Audio: {:?}", cli.audio);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if cli.flip {
        config.mux.flip_horizontal = true;
    }
    config.validate()?;

    // Create and run the engine
    let engine = CompositionEngine::new(config)
        .with_progress(Arc::new(|status: &str| info!("Progress: {}", status)));

    let final_video = engine
        .compose(&cli.images, &cli.audio, &cli.output)
        .await?;

    info!(
        "Done! {:?} ({:.1}s, {:.1} MB)",
        final_video.path,
        final_video.duration_seconds,
        final_video.file_size as f64 / 1024.0 / 1024.0
    );
    Ok(())
}
