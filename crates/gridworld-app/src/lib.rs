//! Seeded churn driver that exercises a [`PopulationGrid`] with random
//! births, deaths, and relocations.

use gridworld_core::{GridConfig, GridError, PersonId, PopulationGrid};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while configuring or running the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Knobs controlling how much the population churns each tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnConfig {
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// People born at random districts every tick.
    pub births_per_tick: u32,
    /// Probability that a living person dies during a tick.
    pub death_chance: f64,
    /// Probability that a surviving person moves during a tick.
    pub move_chance: f64,
    /// Ticks executed by [`ChurnDriver::run_configured`].
    pub ticks: u64,
    /// Ticks between progress summaries; 0 disables them.
    pub report_every: u64,
    /// Audit grid invariants after every tick.
    pub verify: bool,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            births_per_tick: 4,
            death_chance: 0.05,
            move_chance: 0.2,
            ticks: 100,
            report_every: 10,
            verify: false,
        }
    }
}

impl ChurnConfig {
    pub fn validate(&self) -> Result<(), DriverError> {
        if !(0.0..=1.0).contains(&self.death_chance) {
            return Err(DriverError::InvalidConfig(
                "death_chance must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.move_chance) {
            return Err(DriverError::InvalidConfig(
                "move_chance must be within [0, 1]",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG, seeding from entropy if no seed is set.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Counts recorded for a single tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TickReport {
    pub tick: u64,
    pub births: usize,
    pub deaths: usize,
    pub moves: usize,
    pub population: usize,
}

/// Owns a grid and mutates it one tick at a time.
#[derive(Debug)]
pub struct ChurnDriver {
    config: ChurnConfig,
    grid: PopulationGrid,
    rng: SmallRng,
    tick: u64,
    scratch: Vec<PersonId>,
}

impl ChurnDriver {
    pub fn new(grid: &GridConfig, config: ChurnConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let grid = PopulationGrid::from_config(grid)?;
        let rng = config.seeded_rng();
        Ok(Self {
            config,
            grid,
            rng,
            tick: 0,
            scratch: Vec::new(),
        })
    }

    #[must_use]
    pub fn grid(&self) -> &PopulationGrid {
        &self.grid
    }

    #[must_use]
    pub fn config(&self) -> &ChurnConfig {
        &self.config
    }

    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance one tick.
    ///
    /// People alive at the start of the tick are visited in district order,
    /// most senior first; each either dies, moves, or stays. Births happen
    /// before that pass but newborns are not visited.
    pub fn step(&mut self) -> Result<TickReport, DriverError> {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        self.scratch.clear();
        for district in self.grid.districts() {
            let cell = district.cell();
            self.scratch
                .extend(self.grid.iter_members(cell.row, cell.col));
        }

        let (rows, cols) = (self.grid.rows(), self.grid.cols());
        for _ in 0..self.config.births_per_tick {
            let row = self.rng.random_range(0..rows);
            let col = self.rng.random_range(0..cols);
            self.grid.birth(row, col)?;
            report.births += 1;
        }

        for &id in &self.scratch {
            if self.rng.random_bool(self.config.death_chance) {
                self.grid.death(id)?;
                report.deaths += 1;
            } else if self.rng.random_bool(self.config.move_chance) {
                let row = self.rng.random_range(0..rows);
                let col = self.rng.random_range(0..cols);
                self.grid.relocate(id, row, col)?;
                report.moves += 1;
            }
        }

        report.population = self.grid.population();
        if self.config.verify {
            if let Err(err) = self.grid.check_invariants() {
                warn!(tick = self.tick, %err, "grid audit failed");
                return Err(err.into());
            }
        }
        debug!(
            tick = report.tick,
            births = report.births,
            deaths = report.deaths,
            moves = report.moves,
            population = report.population,
            "tick complete"
        );
        Ok(report)
    }

    /// Advance `ticks` ticks, returning each tick's report.
    pub fn run(&mut self, ticks: u64) -> Result<Vec<TickReport>, DriverError> {
        (0..ticks).map(|_| self.step()).collect()
    }

    /// Advance the number of ticks named in the configuration.
    pub fn run_configured(&mut self) -> Result<Vec<TickReport>, DriverError> {
        self.run(self.config.ticks)
    }
}
