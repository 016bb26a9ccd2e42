use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};

use panorama_reel::{CompositionEngine, Config};

#[derive(Parser)]
#[command(
    name = "panorama-reel",
    version,
    about = "Render stamped images into a panning panorama video",
    long_about = "Panorama-Reel stitches a folder of stamped images into one wide panorama, pans across it over background music, appends an outro and overlays a chroma-keyed action clip."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of stamped images
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Directory of background music (mp3, wav)
    #[arg(short, long)]
    music: Option<PathBuf>,

    /// Outro video appended after the pan
    #[arg(long)]
    outro: Option<PathBuf>,

    /// Green-screen action video overlaid on the timeline
    #[arg(short, long)]
    action: Option<PathBuf>,

    /// Output video file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for the music shuffle, for reproducible output
    #[arg(short, long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut Config) {
        let paths = &mut config.paths;
        let overrides = [
            (&self.images, &mut paths.images_dir),
            (&self.music, &mut paths.music_dir),
            (&self.outro, &mut paths.outro),
            (&self.action, &mut paths.action),
            (&self.output, &mut paths.output),
        ];
        for (flag, target) in overrides {
            if let Some(path) = flag {
                *target = path.clone();
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Panorama-Reel v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    cli.apply_to(&mut config);

    let mut engine = CompositionEngine::new(config);
    if let Some(seed) = cli.seed {
        engine = engine.with_seed(seed);
    }

    match engine.compose().await {
        Ok(video) => {
            info!("Output saved to: {:?} ({:.1}s)", video.path, video.duration);
            Ok(())
        }
        Err(e) => {
            error!(stage = e.stage(), "{}", e.user_message());
            Err(e.into())
        }
    }
}
