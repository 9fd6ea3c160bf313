use anyhow::{Context, Result};
use clap::Parser;
use gridworld_app::{ChurnConfig, ChurnDriver};
use gridworld_core::GridConfig;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "gridworld",
    version,
    about = "Run a seeded birth/death/relocation churn over a district grid"
)]
struct Cli {
    /// Number of district rows.
    #[arg(long, default_value_t = 8)]
    rows: u32,
    /// Number of district columns.
    #[arg(long, default_value_t = 8)]
    cols: u32,
    /// Ticks to simulate.
    #[arg(long, default_value_t = 100)]
    ticks: u64,
    /// RNG seed; a random seed is drawn when omitted.
    #[arg(long, env = "GRIDWORLD_SEED")]
    seed: Option<u64>,
    /// Births per tick.
    #[arg(long, default_value_t = 4)]
    births: u32,
    /// Per-tick probability that a living person dies.
    #[arg(long, default_value_t = 0.05)]
    death_chance: f64,
    /// Per-tick probability that a surviving person relocates.
    #[arg(long, default_value_t = 0.2)]
    move_chance: f64,
    /// Ticks between progress summaries (0 disables).
    #[arg(long, default_value_t = 10)]
    report_every: u64,
    /// Audit grid invariants after every tick.
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let grid = GridConfig {
        rows: cli.rows,
        cols: cli.cols,
    };
    let churn = ChurnConfig {
        rng_seed: cli.seed,
        births_per_tick: cli.births,
        death_chance: cli.death_chance,
        move_chance: cli.move_chance,
        ticks: cli.ticks,
        report_every: cli.report_every,
        verify: cli.verify,
    };
    let mut driver = ChurnDriver::new(&grid, churn).context("failed to build churn driver")?;
    info!(rows = grid.rows, cols = grid.cols, ticks = cli.ticks, "Starting GridWorld churn");

    let report_every = driver.config().report_every;
    let (mut births, mut deaths, mut moves) = (0usize, 0usize, 0usize);
    for _ in 0..driver.config().ticks {
        let report = driver
            .step()
            .with_context(|| format!("tick {} failed", driver.tick()))?;
        births += report.births;
        deaths += report.deaths;
        moves += report.moves;
        if report_every > 0 && report.tick % report_every == 0 {
            info!(
                tick = report.tick,
                population = report.population,
                births = report.births,
                deaths = report.deaths,
                moves = report.moves,
                "progress"
            );
        }
    }

    let world = driver.grid();
    let busiest = world
        .districts()
        .max_by_key(|district| district.population());
    match busiest {
        Some(district) if district.population() > 0 => info!(
            row = district.cell().row,
            col = district.cell().col,
            residents = district.population(),
            senior = ?district.head(),
            "Busiest district"
        ),
        _ => warn!("Run finished with an empty grid"),
    }
    info!(
        ticks = driver.tick(),
        population = world.population(),
        births,
        deaths,
        moves,
        identifiers_issued = world.high_water_mark(),
        recycled = world.recycled().count(),
        "Finished GridWorld churn"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
