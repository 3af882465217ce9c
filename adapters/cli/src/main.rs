#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a space shooter level headless and
//! reports what the level director spawned.

mod level_file;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;

/// Plays a level without rendering and prints a spawn summary.
#[derive(Debug, Parser)]
#[command(name = "space-shooter", version, about)]
struct Cli {
    /// Level file to play. The built-in demo level is used when omitted.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,
    /// Simulated seconds to play.
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,
    /// Length of a simulation tick in milliseconds.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Overrides the random seed stored in the level.
    #[arg(long)]
    seed: Option<u64>,
}

/// Entry point for the space shooter command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut schedule = match &cli.level {
        Some(path) => level_file::load_level(path)?,
        None => {
            log::info!("no level file given, playing the demo level");
            level_file::demo_level()
        }
    };
    if let Some(seed) = cli.seed {
        schedule.seed = seed;
    }

    if cli.tick_ms == 0 {
        bail!("`--tick-ms` must be greater than zero");
    }
    let tick = Duration::from_millis(cli.tick_ms);
    let duration = Duration::try_from_secs_f32(cli.seconds).with_context(|| {
        format!(
            "`--seconds` must be a finite, non-negative number, got {}",
            cli.seconds
        )
    })?;

    let waves = schedule.waves.len();
    let summary = simulation::simulate(schedule, duration, tick);

    println!(
        "played {waves} waves for {:.2}s (all waves finished: {})",
        summary.elapsed.as_secs_f32(),
        summary.waves_exhausted
    );
    for (template, count) in &summary.spawned {
        println!("  spawned {count:>4} x {template}");
    }
    for (reason, count) in &summary.removed {
        println!("  removed {count:>4} ({reason})");
    }
    println!("  wave groups destroyed: {}", summary.wave_groups_destroyed);
    println!("  enemies still alive:   {}", summary.live_enemies);
    println!("  spawns rejected:       {}", summary.rejected);
    println!("  diagnostics:           {}", summary.diagnostics);
    Ok(())
}
