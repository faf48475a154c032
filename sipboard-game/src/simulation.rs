//! Batch driver: builds the combat cache, runs sharded games and probes tiles.
use crate::board::Board;
use crate::config::{ConfigError, SimConfig};
use crate::constants::SHARD_SIZE;
use crate::effects::{EffectDispatcher, EffectTable};
use crate::game::{GameRules, GameRunner};
use crate::gym::{CombatCache, GymCatalog};
use crate::numbers::u64_to_f64;
use crate::player::PlayerFlags;
use crate::report::{SimulationReport, TileDrinkAverage};
use crate::seed::RngStreams;
use crate::stats::BatchAggregate;

/// Everything needed to play a batch on one board, built once.
#[derive(Debug, Clone)]
pub struct Simulation {
    board: Board,
    config: SimConfig,
    rules: GameRules,
    dispatcher: EffectDispatcher,
    streams: RngStreams,
}

impl Simulation {
    /// Validate `config` and precompute combat pools with the default tables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration is out of bounds.
    pub fn new(board: Board, config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_tables(board, config, &GymCatalog::default(), EffectTable::default())
    }

    /// As [`Simulation::new`], with caller-supplied gym and effect tables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration is out of bounds.
    pub fn with_tables(
        board: Board,
        config: SimConfig,
        catalog: &GymCatalog,
        table: EffectTable,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let streams = RngStreams::from_user_seed(config.seed);
        let samples = usize::try_from(config.combat_samples).unwrap_or(usize::MAX);
        log::info!(
            "precomputing {samples} combat outcomes for {} gyms",
            board.gyms().len()
        );
        let cache = CombatCache::build(&board, catalog, samples, &mut streams.combat());
        let dispatcher = EffectDispatcher::new(&board, table, cache);
        let rules = GameRules::from_config(&config, &board);
        Ok(Self {
            board,
            config,
            rules,
            dispatcher,
            streams,
        })
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn dispatcher(&self) -> &EffectDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Play games `first..first + count`, each on its own derived stream.
    #[must_use]
    pub fn run_shard(&self, first: u64, count: u32) -> BatchAggregate {
        let runner = GameRunner::new(&self.board, &self.dispatcher, &self.rules);
        let mut aggregate = BatchAggregate::new();
        for game in first..first + u64::from(count) {
            let mut rng = self.streams.game(game);
            let result = runner.play(&mut rng);
            aggregate.record(&result, &self.config.milestones);
        }
        aggregate
    }

    /// Play the configured number of games in shards and merge the results.
    #[must_use]
    pub fn run(&self) -> BatchAggregate {
        let total = self.config.games;
        log::info!(
            "simulating {total} games with {} players (seed {})",
            self.config.players,
            self.streams.user_seed()
        );
        let mut aggregate = BatchAggregate::new();
        let mut first = 0_u32;
        while first < total {
            let count = SHARD_SIZE.min(total - first);
            aggregate.merge(self.run_shard(u64::from(first), count));
            first += count;
            log::info!("  {first}/{total} games");
        }
        if aggregate.timed_out() > 0 {
            log::warn!(
                "{} of {total} games hit the {}-round cap",
                aggregate.timed_out(),
                self.config.max_rounds
            );
        }
        aggregate
    }

    /// Average drinks per tile over fresh-flag landings.
    #[must_use]
    pub fn probe_tiles(&self) -> Vec<TileDrinkAverage> {
        let mut rng = self.streams.probe();
        let samples = self.config.tile_probe_samples.max(1);
        self.board
            .tiles()
            .iter()
            .map(|tile| {
                let total: u64 = (0..samples)
                    .map(|_| {
                        let mut flags = PlayerFlags::default();
                        u64::from(self.dispatcher.resolve(tile, &mut flags, &mut rng).drinks)
                    })
                    .sum();
                TileDrinkAverage {
                    index: tile.index,
                    label: tile.label().to_string(),
                    avg_drinks: u64_to_f64(total) / f64::from(samples),
                }
            })
            .collect()
    }

    /// Run the batch, probe the board and assemble the report.
    #[must_use]
    pub fn report(&self) -> SimulationReport {
        let aggregate = self.run();
        let stats = aggregate.finish(&self.config.milestones);
        let probe = self.probe_tiles();
        SimulationReport::build(self, stats, &probe)
    }
}

/// Convenience entry point: build, run and report in one call.
///
/// # Errors
///
/// Returns `ConfigError` when the configuration is out of bounds.
pub fn run_simulation(board: Board, config: SimConfig) -> Result<SimulationReport, ConfigError> {
    Ok(Simulation::new(board, config)?.report())
}
