//! vidkit simulator (vidkit-sim) - Main entry point
//!
//! Plays one simulated clip through the full player stack (coordinator,
//! state machine, EventBus delegate) and prints every `PlayerEvent` as JSON.

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidkit_common::{ConfigResolver, EventBus, LoggingConfig, PlayerEvent};
use vidkit_player::engine::sim::{SimEngine, SimMedia};
use vidkit_player::{
    input_channel, ControlsStyle, ControlsSurface, EventBusDelegate, LayerSurface, MediaSource,
    Player, PlayerDelegate, VideoSurface,
};

/// Command-line arguments for vidkit-sim
#[derive(Parser, Debug)]
#[command(name = "vidkit-sim")]
#[command(about = "Simulated video playback through the vidkit player core")]
#[command(version)]
struct Args {
    /// Locator of the simulated clip
    #[arg(default_value = "sim://clip.mp4")]
    locator: String,

    /// Clip duration in seconds
    #[arg(long, default_value = "10")]
    duration_secs: f64,

    /// Restart from zero at end of media
    #[arg(long)]
    loops: bool,

    /// Number of loops before stopping (with --loops)
    #[arg(long, default_value = "2")]
    max_loops: u32,

    /// Stop on the last frame instead of rewinding
    #[arg(long)]
    freeze_at_end: bool,

    /// Wait for an explicit play instead of autoplaying
    #[arg(long)]
    no_autoplay: bool,

    /// Simulate media that resolves but cannot be played
    #[arg(long)]
    unplayable: bool,

    /// Present through system controls instead of a bare layer
    #[arg(long)]
    controls: bool,

    /// Simulated seconds per wall-clock second
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// Config file (overrides VIDKIT_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new(args.config.clone())
        .load()
        .context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;

    let mut settings = config.player;
    if args.loops {
        settings.playback_loops = true;
    }
    if args.freeze_at_end {
        settings.playback_freezes_at_end = true;
    }
    if args.no_autoplay {
        settings.autoplay = false;
    }

    info!("Starting vidkit-sim for {}", args.locator);

    // Simulated engine with one registered clip
    let engine = SimEngine::new();
    let controller = engine.controller();
    let duration = Duration::from_secs_f64(args.duration_secs.max(0.1));
    let media = if args.unplayable {
        SimMedia::unplayable(duration)
    } else {
        SimMedia::clip(duration)
    };
    controller.register(args.locator.clone(), media);

    let surface: Box<dyn VideoSurface> = if args.controls {
        Box::new(ControlsSurface::new(ControlsStyle::default()))
    } else {
        Box::new(LayerSurface::new())
    };

    let event_bus = EventBus::new(1000);
    let mut events = event_bus.subscribe();
    let delegate: Arc<dyn PlayerDelegate> = Arc::new(EventBusDelegate::new(event_bus));

    let (sink, inbox) = input_channel();
    let mut player = Player::new(Box::new(engine), surface, settings.clone(), sink);
    player.set_delegate(Some(delegate));

    let (handle, task) = vidkit_player::spawn(player, inbox);
    handle.load(MediaSource::Locator(args.locator.as_str().into()))?;
    if !settings.autoplay {
        handle.play_from_current_time()?;
    }

    // Drive the simulated clock
    let step = Duration::from_millis(10);
    let sim_step = Duration::from_secs_f64(step.as_secs_f64() * args.speed.max(0.0));
    let mut ticker = tokio::time::interval(step);
    let mut loops = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => controller.advance(sim_step),
            received = events.recv() => match received {
                Ok(event) => {
                    if !matches!(event, PlayerEvent::CurrentTimeChanged { .. }) {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    if let PlayerEvent::WillLoop { .. } = event {
                        loops += 1;
                        if loops >= args.max_loops {
                            info!("Reached {} loops, stopping", loops);
                            handle.stop()?;
                        }
                    }
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("Event listener lagged by {} events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    let snapshot = handle.snapshot().await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    handle.shutdown().await?;
    task.await.context("Coordinator task panicked")?;
    info!("vidkit-sim finished");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vidkit_player={0},vidkit_common={0}", logging.level).into());

    let file_layer = match &logging.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}
