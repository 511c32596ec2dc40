use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use qflow_anim::{run_animation, AnimationConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Animate one corridor trajectory log as an MP4")]
struct Cli {
    /// Trajectory file (`t id x y vx vy radius` per line)
    input: PathBuf,

    /// JSON config with corridor geometry and rendering options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output MP4 path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Directory for the PNG frames
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Keep the PNG frames after encoding
    #[arg(long)]
    keep_frames: bool,

    /// ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => AnimationConfig::load(path)?,
        None => AnimationConfig::default(),
    };
    if let Some(v) = cli.output {
        cfg.output = v;
    }
    if let Some(v) = cli.fps {
        cfg.fps = v;
    }
    if let Some(v) = cli.frames_dir {
        cfg.frames_dir = Some(v);
    }
    if cli.keep_frames {
        cfg.keep_frames = true;
    }
    if let Some(v) = cli.ffmpeg {
        cfg.ffmpeg = v;
    }
    cfg.validate().context("invalid animation configuration")?;

    let summary = run_animation(&cli.input, &cfg)?;

    println!(
        "Animation complete. Frames: {} | Exited particles: {}",
        summary.frames, summary.completed
    );
    println!("MP4: {}", summary.output.display());
    if cfg.keep_frames {
        println!("Frames: {}", summary.frames_dir.display());
    }

    Ok(())
}
