#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Maze Chase sessions headlessly.

mod autopilot;
mod board;
mod config;
mod runner;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use maze_chase_system_commentary::StaticCommentator;
use maze_chase_world::World;
use tokio::{runtime::Builder, task::LocalSet};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    config::Settings,
    runner::{RunOptions, RunSummary},
};

/// Headless Maze Chase runner.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", version)]
struct CliArgs {
    /// TOML file with tuning, layout and commentary settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Text maze layout overriding the configured one.
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Seed for adversary randomness and the autopilot.
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum frames simulated per session.
    #[arg(long, default_value_t = 3_600)]
    frames: u32,
    /// Frame period in milliseconds; 0 runs unpaced.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Number of sessions to play back to back.
    #[arg(long, default_value_t = 1)]
    sessions: u32,
    /// Frames between autopilot steering decisions; 0 disables the autopilot.
    #[arg(long, default_value_t = 12)]
    steer_every: u32,
    /// Print the final frame as text.
    #[arg(long)]
    show_board: bool,
}

/// Entry point for the Maze Chase command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();
    let settings = Settings::load(args.config.as_deref(), args.layout.as_deref(), args.seed)?;
    let options = RunOptions {
        frames_per_session: args.frames,
        sessions: args.sessions,
        frame_interval: (args.frame_ms > 0).then(|| Duration::from_millis(args.frame_ms)),
        steer_every: args.steer_every,
        autopilot_seed: settings.tuning.seed.rotate_left(17),
        commentary_timeout: settings.commentary_timeout,
    };
    let commentator = StaticCommentator::with_latency(settings.commentary_latency);
    let world = World::with_layout(settings.layout, settings.tuning);

    let runtime = Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to build async runtime")?;
    let summary = LocalSet::new().block_on(&runtime, runner::run(world, commentator, &options))?;

    print_summary(&summary);
    if args.show_board {
        print!("{}", summary.final_board);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for session in &summary.sessions {
        let commentary = session.commentary.as_deref().unwrap_or("(no commentary)");
        println!(
            "session {}: {:?} score={} lives={} frames={} | {}",
            session.session.get(),
            session.state,
            session.score,
            session.lives,
            session.frames,
            commentary
        );
    }
    println!(
        "high score: {} ({} collectibles left on the board)",
        summary.high_score, summary.final_frame.remaining_collectibles
    );
}
