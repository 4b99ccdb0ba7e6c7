//! KinetPlayer command line player
//!
//! Loads a show bundle (or builds a test grid), then streams it to a KiNET
//! controller until interrupted.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use kinet_control::KinetSender;
use kinet_core::{EffectKind, PixelMap};
use kinet_io::LoadedShow;
use kinet_media::{FrameSource, VideoFrameSource};
use kinet_player::{logging_setup, Engine, EngineSettings, PlayerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "kinet-player", version, about = "Stream lighting shows over KiNET")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = "kinet-player.toml")]
    config: PathBuf,

    /// Show bundle to play (.kshow)
    #[arg(short, long)]
    bundle: Option<PathBuf>,

    /// Directory the bundle is extracted into
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Controller host, overriding the show and the config file
    #[arg(short, long)]
    destination: Option<String>,

    /// Controller UDP port
    #[arg(long)]
    port: Option<u16>,

    /// Color strategy: hue-sweep, solid, sparkle
    #[arg(short, long)]
    effect: Option<EffectKind>,

    /// Grid size when no bundle is given, e.g. 32x8
    #[arg(long, value_parser = parse_grid)]
    grid: Option<(u32, u32)>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    run_for: Option<f64>,
}

fn parse_grid(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width: u32 = w.trim().parse().map_err(|e| format!("width: {}", e))?;
    let height: u32 = h.trim().parse().map_err(|e| format!("height: {}", e))?;
    if width == 0 || height == 0 {
        return Err("grid dimensions must be non-zero".to_string());
    }
    Ok((width, height))
}

impl Cli {
    fn apply(&self, config: &mut PlayerConfig) {
        if let Some(destination) = &self.destination {
            config.output.destination = Some(destination.clone());
        }
        if let Some(port) = self.port {
            config.output.port = port;
        }
        if let Some(effect) = self.effect {
            config.effect.kind = effect;
        }
        if let Some((width, height)) = self.grid {
            config.grid.width = width;
            config.grid.height = height;
        }
    }
}

/// Everything needed to build an engine
struct Show {
    pixel_map: PixelMap,
    frame_source: FrameSource,
    destination: String,
}

fn default_workdir(bundle: &Path) -> PathBuf {
    let stem = bundle
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "show".to_string());
    std::env::temp_dir().join("kinet-player").join(stem)
}

fn load_bundle(bundle: &Path, workdir: &Path, config: &PlayerConfig) -> Result<Show> {
    let LoadedShow {
        manifest,
        media_path,
        ..
    } = kinet_io::load_show(bundle, workdir)
        .with_context(|| format!("Failed to load show bundle {}", bundle.display()))?;

    let pixel_map = PixelMap::from_manifest(&manifest);
    if pixel_map.is_empty() {
        warn!("Show '{}' defines no pixels", manifest.name);
    }

    let frame_source = match media_path {
        Some(path) if path.exists() => FrameSource::Video(
            VideoFrameSource::open(&path, pixel_map.width(), pixel_map.height())
                .with_context(|| format!("Show media cannot be played: {}", path.display()))?,
        ),
        Some(path) => bail!("Show media not found: {}", path.display()),
        None => FrameSource::None,
    };

    let destination = config
        .output
        .destination
        .clone()
        .or_else(|| manifest.primary_address().map(str::to_string))
        .ok_or_else(|| anyhow!("Show '{}' has no fixture address; pass --destination", manifest.name))?;

    info!(
        "Show '{}': {}x{} grid, {} fixtures",
        manifest.name,
        pixel_map.width(),
        pixel_map.height(),
        pixel_map.len()
    );

    Ok(Show {
        pixel_map,
        frame_source,
        destination,
    })
}

fn build_grid(config: &PlayerConfig) -> Result<Show> {
    let destination = config
        .output
        .destination
        .clone()
        .context("No destination: pass --destination or set output.destination")?;

    let grid = config.grid;
    info!(
        "Test grid {}x{} starting at universe {}",
        grid.width, grid.height, grid.start_universe
    );

    Ok(Show {
        pixel_map: PixelMap::create_grid(grid.width, grid.height, grid.start_universe),
        frame_source: FrameSource::None,
        destination,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PlayerConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let _log_guard = logging_setup::init(&config.logging)?;
    info!("KinetPlayer {}", env!("CARGO_PKG_VERSION"));

    let show = match &cli.bundle {
        Some(bundle) => {
            let workdir = cli
                .workdir
                .clone()
                .unwrap_or_else(|| default_workdir(bundle));
            load_bundle(bundle, &workdir, &config)?
        }
        None => build_grid(&config)?,
    };

    let strategy = config.effect.build_strategy()?;
    let sender = KinetSender::with_port(show.destination, config.output.port);
    let engine = Engine::with_sources(
        show.pixel_map,
        strategy,
        show.frame_source,
        sender,
        EngineSettings::from(&config.engine),
    );

    engine.start()?;

    match cli.run_for {
        Some(seconds) if seconds.is_finite() && seconds >= 0.0 => {
            tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
        }
        _ => {
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
    }

    engine.stop().await;

    let stats = engine.stats();
    info!(
        "Sent {} packets over {} ticks ({} dropped, {} media frames)",
        stats.packets_sent, stats.ticks, stats.send_failures, stats.frames_sampled
    );
    Ok(())
}
