//! Binary entrypoint for wallcover.
//!
//! Runs the wallpaper engine against an in-memory surface, driven by a
//! simulated launcher and a watched settings file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use rust_wallcover::config::{Configuration, parse_rotation_time};
use rust_wallcover::engine::Engine;
use rust_wallcover::render::surface::MemorySurface;
use rust_wallcover::tasks::{settings, shell, wallpaper};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "wallcover",
    version,
    about = "scrolling multi-screen wallpaper engine"
)]
struct Args {
    /// Path to YAML settings file (watched for changes)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Surface width in pixels
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 1920)]
    height: u32,

    /// Swipe to the next page this often (e.g. "3s"); omit to stay on page one
    #[arg(long, value_name = "DURATION", value_parser = parse_rotation_time)]
    swipe_every: Option<Duration>,

    /// Write every presented frame to this image file
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(
            format!("rust_wallcover={level}")
                .parse()
                .context("invalid log directive")?,
        );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        width,
        height,
        swipe_every,
        snapshot,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::info!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);

    let (host_tx, host_rx) = mpsc::channel(64); // Shell + Settings -> Wallpaper
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // Settings
    tasks.spawn({
        let path = config.clone();
        let cfg = cfg.clone();
        let host_tx = host_tx.clone();
        let cancel = cancel.clone();
        async move {
            settings::run(path, cfg, host_tx, cancel)
                .await
                .context("settings task failed")
        }
    });

    // Shell
    tasks.spawn({
        let opts = shell::ShellOptions {
            width,
            height,
            pages: cfg.screen_count,
            swipe_every,
        };
        let cancel = cancel.clone();
        async move {
            shell::run(opts, host_tx, cancel)
                .await
                .context("shell task failed")
        }
    });

    let mut surface = MemorySurface::new(width, height);
    if let Some(path) = snapshot {
        surface = surface.with_snapshot(path);
    }
    let result = wallpaper::run(Engine::new(cfg), surface, host_rx, cancel.clone())
        .await
        .context("wallpaper task failed");
    match &result {
        Ok((engine, surface)) => tracing::info!(
            stats = ?engine.stats(),
            presented = surface.presented(),
            "wallpaper finished"
        ),
        Err(err) => tracing::error!("{err:?}"),
    }

    cancel.cancel();
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }
    result.map(|_| ())
}
