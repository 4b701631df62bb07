use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use yumyum_lib::model::config::AppConfig;
use yumyum_lib::model::state::{GameMode, PopulationStats};
use yumyum_lib::model::{init_logging, TickContext};
use yumyum_lib::World;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path; defaults are used when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 3600)]
    ticks: u64,

    /// Rule set: eco or rps
    #[arg(short, long, default_value = "eco")]
    mode: GameMode,

    /// Override the world seed
    #[arg(long)]
    seed: Option<u64>,

    /// Entities of each kind to place before starting
    #[arg(short, long, default_value_t = 5)]
    populate: usize,

    /// Pace ticks at the configured frame rate instead of running flat out
    #[arg(long)]
    realtime: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print a JSON run summary instead of the text report
    #[arg(long)]
    json: bool,

    /// Append every live event to this JSON-lines file
    #[arg(long)]
    events: Option<String>,
}

#[derive(Serialize)]
struct RunSummary {
    ticks: u64,
    time_ms: f64,
    mode: GameMode,
    stats: PopulationStats,
    samples: usize,
    average_tick_us: u128,
    state_hash: String,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if Path::new(&args.config).exists() {
        let content = std::fs::read_to_string(&args.config)
            .with_context(|| format!("Failed to read {}", args.config))?;
        AppConfig::from_toml(&content)?
    } else {
        AppConfig::default()
    };
    if args.seed.is_some() {
        config.world.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load_config(&args)?;
    let frame = TickContext::frame(config.target_fps);
    let mut world = match &args.events {
        Some(path) => World::new_at(config, path)?,
        None => World::new(config)?,
    };

    world.set_mode(args.mode);
    world.populate(args.populate);
    world.set_running(true);

    if args.realtime {
        let mut interval = tokio::time::interval(Duration::from_secs_f64(frame.dt_ms / 1000.0));
        for _ in 0..args.ticks {
            interval.tick().await;
            world.update(&frame);
        }
    } else {
        for _ in 0..args.ticks {
            world.update(&frame);
        }
    }

    // Let the ramp ease out so the final snapshot is at rest.
    world.set_running(false);
    while world.is_active() {
        world.update(&frame);
    }
    world.logger.flush()?;

    let summary = RunSummary {
        ticks: world.tick,
        time_ms: world.time_ms,
        mode: world.mode,
        stats: world.stats().clone(),
        samples: world.history().len(),
        average_tick_us: world.metrics.average_tick().as_micros(),
        state_hash: world.state_hash()?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Simulated {} ticks ({:.1} s) in {} mode", summary.ticks, summary.time_ms / 1000.0, summary.mode);
        for kind in yumyum_lib::model::state::EntityKind::ALL {
            println!("  {} {:<6} {}", kind.emoji(), kind.name(), summary.stats.count(kind));
        }
        println!("  total entities:      {}", summary.stats.total_entities);
        println!("  average energy:      {}", summary.stats.average_energy);
        println!("  total reproductions: {}", summary.stats.total_reproductions);
        println!("  avg tick:            {} us", summary.average_tick_us);
        println!("  state hash:          {}", summary.state_hash);
    }
    Ok(())
}
