/// Scene3D Terminal Demo - Ground, scattered spheres and an orbiting pair
///
/// Controls:
///   - Arrow Keys: Step forward/back, turn left/right
///   - WASD: Move continuously while held
///   - Space: Jump
///   - Q/ESC: Quit

use anyhow::{Context, Result};
use clap::Parser;
use scene3d_core::SceneConfig;
use scene3d_terminal::TerminalApp;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scene3d-terminal", about = "Walk around a procedural 3D scene in the terminal")]
struct Args {
    /// Scene configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the sphere layout
    #[arg(long)]
    seed: Option<u64>,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Write logs here; the terminal itself is busy drawing
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let mut config = match &args.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if args.seed.is_some() {
        config.sphere.seed = args.seed;
    }

    tracing::info!(?config, fps = args.fps, "starting terminal renderer");

    let mut app = TerminalApp::new(&config, args.fps)?;
    app.run()?;

    println!("Thank you for using Scene3D Terminal Renderer!");
    Ok(())
}
