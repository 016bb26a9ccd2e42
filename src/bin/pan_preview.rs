// Assemble the panorama and dump PNG stills of the pan at chosen times

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};

use panorama_reel::{
    video::{Clip, PanClip, PanoramaAssembler},
    Config,
};

#[derive(Parser)]
#[command(name = "pan-preview", version, about = "Save still frames of the panorama pan")]
struct Cli {
    /// Directory of stamped images
    #[arg(short, long)]
    images: PathBuf,

    /// Directory the stills are written to
    #[arg(short, long)]
    out: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pan times in seconds; start, middle and end when omitted
    #[arg(short, long, value_delimiter = ',')]
    times: Vec<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.validate()?;

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating {}", cli.out.display()))?;

    println!("🖼️  Assembling panorama from {}", cli.images.display());
    let assembler = PanoramaAssembler::new(cli.out.join("panorama.png"), config.timing.per_image_seconds);
    let panorama = assembler.assemble_directory(&cli.images)?;
    println!("   {} images, {}x{}, pan {:.1}s",
             panorama.image_count, panorama.width(), panorama.height(), panorama.suggested_duration);

    let params = &config.video.params;
    let mut pan = PanClip::new(panorama.image.clone(), panorama.suggested_duration, params.resolution)?;

    let times = if cli.times.is_empty() {
        let end = (pan.duration() - 1.0 / params.fps).max(0.0);
        vec![0.0, pan.duration() / 2.0, end]
    } else {
        cli.times.clone()
    };

    for (index, t) in times.iter().enumerate() {
        let frame = pan.frame_at(*t)?;
        let path = cli.out.join(format!("pan_{:03}_{:.2}s.png", index, t));
        frame.save_png(&path)
            .with_context(|| format!("saving {}", path.display()))?;
        info!("t={:.2}s offset={}px -> {}", t, pan.offset_at(*t), path.display());
    }

    println!("✅ {} stills written to {}", times.len(), cli.out.display());
    Ok(())
}
