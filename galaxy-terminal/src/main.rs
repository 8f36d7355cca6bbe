//! Galaxy Terminal Demo
//!
//! Renders the procedural galaxy (and an optional STL model) as coloured
//! ASCII. Press `h` in the app for the debug panel, `q` to quit.

use anyhow::Context;
use clap::Parser;
use galaxy_core::resources::{self, LoadTask, Source};
use galaxy_core::world::MODEL_RESOURCE;
use galaxy_core::{AppConfig, Experience, Sizes};
use galaxy_terminal::{logical_size, FsFetch, TerminalApp};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Procedural galaxy renderer for the terminal
#[derive(Parser, Debug)]
#[command(name = "galaxy-terminal", version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// STL model placed at the galaxy centre
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Open the debug panel on start
    #[arg(short, long)]
    debug: bool,

    /// Target frame rate (overrides config)
    #[arg(long)]
    fps: Option<u32>,

    /// Seed for reproducible galaxies
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file; the terminal itself is used for drawing
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if args.debug {
        config.debug = true;
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    config.validate()?;
    info!(?config, "Starting galaxy-terminal v{}", env!("CARGO_PKG_VERSION"));

    let mut sources = Vec::new();
    if let Some(model) = &args.model {
        sources.push(Source::model(MODEL_RESOURCE, model.to_string_lossy()));
    }

    println!("Galaxy Terminal Renderer - Loading...");
    let fetch = FsFetch::default();
    let (task, _handle) = LoadTask::new(resources::load(&sources, &fetch, |progress| {
        println!("  loaded {}/{}", progress.loaded, progress.total);
    }));
    let loaded = pollster::block_on(task).context("loading resources")?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (columns, rows) = crossterm::terminal::size()?;
    let (width, height) = logical_size(columns, rows);
    let mut experience = Experience::new(&config, Sizes::new(width, height, 1.0), rng);
    experience.attach_resources(&loaded)?;

    let mut app = TerminalApp::new(experience, config.fps)?;
    app.run()?;

    println!("Thank you for using the Galaxy Terminal Renderer!");
    Ok(())
}
