//! Headless timeline-fork trainer.
//!
//! Drives the reference track world for a fixed number of ticks and writes
//! checkpoints to the weights file as training progresses.
//!
//! ```text
//! RUST_LOG=info forkdrive --weights policy.txt --ticks 500000
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_forkdrive::core::{Action, Mode, TrainerConfig};
use rust_forkdrive::tracks::simple::SimpleTrackBuilder;
use rust_forkdrive::training::{FileStore, TimelineTrainer, TrainingEvent};

/// Train or run a driving policy on the built-in track.
#[derive(Parser)]
#[command(name = "forkdrive")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Weights file, read at start and rewritten at every checkpoint
    #[arg(short, long, default_value = "weights.txt")]
    weights: PathBuf,

    /// Number of simulation ticks to run
    #[arg(short, long, default_value = "100000")]
    ticks: u64,

    /// Mode selector: 1 manual (idle), 2 autonomous, 3 training
    #[arg(short, long, default_value = "3")]
    mode: u8,

    /// Trainer configuration as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrainerConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TrainerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let mode = Mode::from_selector(args.mode)
        .ok_or_else(|| anyhow!("mode must be 1, 2 or 3, got {}", args.mode))?;

    let mut world = SimpleTrackBuilder::new()
        .time_step_ms(config.tick_ms)
        .sight_range(config.sensors.max_sight_range)
        .build();
    let mut trainer = TimelineTrainer::new(config, FileStore::new(&args.weights))
        .context("initialising trainer")?;
    trainer.select_mode(mode);

    info!(mode = %mode, ticks = args.ticks, weights = %args.weights.display(), "starting");

    for tick in 0..args.ticks {
        let report = trainer
            .tick(&mut world, Action::IDLE)
            .with_context(|| format!("tick {tick}"))?;
        if report.events.iter().any(|e| matches!(e, TrainingEvent::Faulted(_))) {
            world.reset();
            trainer.select_mode(mode);
            continue;
        }
        world.step();
    }

    let stats = trainer.stats();
    println!("generation:        {}", trainer.generation());
    println!("ticks:             {}", stats.ticks);
    println!("cycles:            {}", stats.cycles);
    println!("learning events:   {}", stats.learning_events);
    println!("checkpoints:       {} ({} failed)", stats.checkpoints, stats.failed_checkpoints);
    println!("teleports:         {}", stats.teleports);
    println!("faults:            {}", stats.faults);
    println!("collisions:        {}", world.collisions());
    println!("laps:              {}", world.laps());

    if mode == Mode::Training {
        trainer.save().context("saving final weights")?;
    }
    Ok(())
}
