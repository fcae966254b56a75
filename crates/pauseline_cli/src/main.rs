//! Pauseline CLI
//!
//! Play, pause, and check timeline compositions from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pauseline_animation::{
    AnimatableProperty, Composition, CompositionConfig, SharedProperty, TimelineController,
    TimelineDriver, TokioClock, TweenedProperty,
};
use pauseline_core::SharedClock;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

#[derive(Parser)]
#[command(name = "pauseline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Play/pause-able animation timelines", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a composition, printing property values as it runs
    ///
    /// Press Enter to toggle play/pause, type `q` and Enter to quit.
    Play {
        /// Composition file (defaults to pauseline.toml, then the demo)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Milliseconds between printed frames
        #[arg(short, long, default_value = "100")]
        tick_ms: u64,

        /// Stop after this many seconds of wall time
        #[arg(short, long)]
        duration: Option<f64>,

        /// Start playing immediately, overriding the file
        #[arg(short, long)]
        autoplay: bool,
    },

    /// Validate a composition file
    Check {
        /// Composition file
        #[arg(default_value = config::DEFAULT_FILE)]
        source: PathBuf,
    },

    /// Write the demo composition to a file
    Init {
        /// Output path
        #[arg(default_value = config::DEFAULT_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Play {
            config,
            tick_ms,
            duration,
            autoplay,
        } => cmd_play(config.as_deref(), tick_ms, duration, autoplay),

        Commands::Check { source } => cmd_check(&source),

        Commands::Init { output, force } => cmd_init(&output, force),
    }
}

fn cmd_play(path: Option<&Path>, tick_ms: u64, duration: Option<f64>, autoplay: bool) -> Result<()> {
    let (mut composition, source) = config::load_or_demo(path)?;
    match &source {
        Some(path) => info!("Playing {}", path.display()),
        None => info!("Playing the demo composition"),
    }
    if autoplay {
        composition.autoplay = true;
    }
    if tick_ms == 0 {
        anyhow::bail!("--tick-ms must be greater than 0");
    }
    let duration = match duration {
        Some(secs) if secs > 0.0 => match Duration::try_from_secs_f64(secs) {
            Ok(duration) => Some(duration),
            Err(_) => anyhow::bail!("--duration {} is out of range", secs),
        },
        Some(_) => anyhow::bail!("--duration must be a positive number of seconds"),
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;

    runtime.block_on(play(
        composition,
        Duration::from_millis(tick_ms),
        duration,
    ))
}

async fn play(
    composition: CompositionConfig,
    tick: Duration,
    duration: Option<Duration>,
) -> Result<()> {
    let clock: SharedClock = Arc::new(TokioClock);
    let (scheduler, properties) = Composition::build(&composition, clock)?.into_parts();
    let (driver, controller) = TimelineDriver::spawn(scheduler);

    spawn_keyboard(controller.clone());
    if !controller.is_playing() {
        info!("Paused - press Enter to play");
    }

    let mut frames = tokio::time::interval(tick);
    let mut playing = controller.playing();
    let time = controller.current_time();
    let stop = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                if driver.is_finished() {
                    break;
                }
                if controller.is_playing() {
                    let Ok(time) = controller.configure(|s| s.elapsed_time()).await else {
                        break;
                    };
                    print_frame(time, &properties);
                }
            }
            changed = playing.changed() => {
                if changed.is_err() {
                    warn!("Timeline driver stopped");
                    break;
                }
                let now_playing = *playing.borrow_and_update();
                info!("{}", if now_playing { "Playing" } else { "Paused" });
                print_frame(*time.borrow(), &properties);
            }
            _ = &mut stop => {
                debug!("Run duration elapsed");
                break;
            }
        }
    }

    // Already stopped if the keyboard asked to quit
    let _ = controller.shutdown();
    let scheduler = driver.join().await?;
    info!("Stopped at t={:.3}s", scheduler.elapsed_time());
    Ok(())
}

fn print_frame(time: f64, properties: &[(String, SharedProperty<TweenedProperty>)]) {
    let values = properties
        .iter()
        .map(|(name, property)| format!("{}={:>9.3}", name, property.value()))
        .collect::<Vec<_>>()
        .join("  ");
    println!("t={:>6.3}  {}", time, values);
}

/// Read stdin on a plain thread: Enter toggles, `q` quits
fn spawn_keyboard(controller: TimelineController) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let result = match line.trim() {
                "q" | "quit" => {
                    let _ = controller.shutdown();
                    break;
                }
                "" | "p" => controller.toggle_playing(),
                other => {
                    warn!("Unknown input '{}' (Enter toggles, q quits)", other);
                    Ok(())
                }
            };
            if result.is_err() {
                break;
            }
        }
    });
}

fn cmd_check(source: &Path) -> Result<()> {
    let composition = config::load(source)?;

    info!("Checking {}", source.display());
    println!("max_time: {}s", composition.max_time);
    if !composition.extra_wake_times.is_empty() {
        println!("extra wake times: {:?}", composition.extra_wake_times);
    }
    for segment in &composition.segments {
        println!(
            "  {:<12} [{:.3}, {:.3})  {} -> {}  ({:?})",
            segment.name, segment.start, segment.end, segment.from, segment.to, segment.easing
        );
        if segment.end > composition.max_time {
            warn!(
                "Segment '{}' ends after max_time; it will be cut off by the loop",
                segment.name
            );
        }
    }
    info!("{} segment(s) OK", composition.segments.len());
    Ok(())
}

fn cmd_init(output: &Path, force: bool) -> Result<()> {
    config::write_demo(output, force)?;
    info!("Demo composition written to {}", output.display());
    info!("Run `pauseline play --config {}` to play it", output.display());
    Ok(())
}
