#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Jinri's Adventure session.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use jinri_cli::{arena, input::RandomInput, Simulation, SimulationSeeds};
use jinri_core::{GameStatus, SimulationConfig};
use jinri_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments accepted by the binary.
#[derive(Debug, Parser)]
#[command(name = "jinri", about = "Runs a seeded headless session of the simulation")]
struct CliArgs {
    /// Seed shared by the arena, spawns, wander goals and input.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 3600)]
    frames: u64,
    /// Arena width in tiles.
    #[arg(long, default_value_t = 48)]
    columns: u32,
    /// Arena height in tiles.
    #[arg(long, default_value_t = 40)]
    rows: u32,
    /// Monsters placed on the map.
    #[arg(long, default_value_t = 10)]
    monsters: usize,
    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

/// Entry point for the command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let layout = arena::generate(args.columns, args.rows, args.seed)
        .context("failed to generate the arena")?;
    let mut simulation = Simulation::new(
        SimulationConfig::default(),
        args.monsters,
        SimulationSeeds::from_seed(args.seed),
        Duration::from_millis(args.frame_ms),
    );
    let _ = simulation.load(layout).context("failed to load the arena")?;
    println!("{}", query::welcome_banner(simulation.world()));

    let mut input = RandomInput::new(args.seed);
    for _ in 0..args.frames {
        let _ = simulation.step(&input.next_frame());
        if query::status(simulation.world()) == GameStatus::Ended {
            break;
        }
    }

    let outcome = simulation.outcome();
    info!(?outcome, "session finished");
    println!("{outcome}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
