//! Serializable report model assembled from a finished batch.
use serde::Serialize;

use crate::board::Board;
use crate::constants::{
    COLLATERAL_FACTOR, GLOBAL_HEAVY_LIMIT, MINUTES_PER_ROUND, SECTION_HEAVY_LIMIT, SIPS_PER_BEER,
    TIMEOUT_WARN_SHARE,
};
use crate::gym::GymSummary;
use crate::simulation::Simulation;
use crate::stats::{BatchStats, MilestoneRate, Summary};

/// Average drinks for landing on one tile with fresh flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileDrinkAverage {
    pub index: usize,
    pub label: String,
    pub avg_drinks: f64,
}

/// Parameters the batch ran with, echoed into the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunParameters {
    pub games: u32,
    pub players: u32,
    pub combat_samples: u32,
    pub max_rounds: u32,
    pub seed: u64,
}

/// Headline numbers for the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub avg_rounds: f64,
    pub rounds_p10: u32,
    pub rounds_p90: u32,
    pub avg_turns: f64,
    pub avg_tiles_landed: f64,
    pub avg_drinks: f64,
    pub avg_beers: f64,
    pub collateral_drinks: f64,
    pub collateral_beers: f64,
    pub play_time_hours: (f64, f64),
    pub drinks: Summary,
}

impl Headline {
    #[must_use]
    pub fn from_stats(stats: &BatchStats) -> Self {
        let avg_drinks = stats.drinks.mean;
        let collateral_drinks = avg_drinks * COLLATERAL_FACTOR;
        let (low, high) = MINUTES_PER_ROUND;
        Self {
            avg_rounds: stats.rounds.mean,
            rounds_p10: stats.rounds.p10,
            rounds_p90: stats.rounds.p90,
            avg_turns: stats.turns.mean,
            avg_tiles_landed: stats.tiles_landed.mean,
            avg_drinks,
            avg_beers: avg_drinks / SIPS_PER_BEER,
            collateral_drinks,
            collateral_beers: collateral_drinks / SIPS_PER_BEER,
            play_time_hours: (
                stats.rounds.mean * low / 60.0,
                stats.rounds.mean * high / 60.0,
            ),
            drinks: stats.drinks,
        }
    }
}

/// Heaviest tiles within one stretch of the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub heavy_tiles: Vec<TileDrinkAverage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub tiles: usize,
    pub gyms: usize,
    pub optional_stops: usize,
    pub zones: Vec<(String, usize)>,
}

impl BoardSummary {
    #[must_use]
    pub fn from_board(board: &Board) -> Self {
        Self {
            tiles: board.len(),
            gyms: board.gyms().len(),
            optional_stops: board.optional_stops().len(),
            zones: board.zone_counts(),
        }
    }
}

/// Complete output of a simulation batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub parameters: RunParameters,
    pub headline: Headline,
    pub stats: BatchStats,
    pub gyms: Vec<GymSummary>,
    pub heavy_tiles: Vec<TileDrinkAverage>,
    pub sections: Vec<SectionReport>,
    pub milestones: Vec<MilestoneRate>,
    pub board: BoardSummary,
    pub timeout_warning: bool,
}

impl SimulationReport {
    #[must_use]
    pub fn build(simulation: &Simulation, stats: BatchStats, probe: &[TileDrinkAverage]) -> Self {
        let config = simulation.config();
        let board = simulation.board();
        let heavy = heavy_tiles(probe, config.heavy_tile_threshold);

        let sections = board
            .sections()
            .into_iter()
            .map(|section| SectionReport {
                heavy_tiles: heavy
                    .iter()
                    .filter(|t| section.start <= t.index && t.index <= section.end)
                    .take(SECTION_HEAVY_LIMIT)
                    .cloned()
                    .collect(),
                label: section.label,
                start: section.start,
                end: section.end,
            })
            .collect();

        Self {
            parameters: RunParameters {
                games: config.games,
                players: config.players,
                combat_samples: config.combat_samples,
                max_rounds: config.max_rounds,
                seed: config.seed,
            },
            headline: Headline::from_stats(&stats),
            gyms: simulation.dispatcher().cache().summaries(),
            heavy_tiles: heavy.into_iter().take(GLOBAL_HEAVY_LIMIT).collect(),
            sections,
            milestones: stats.milestones.clone(),
            board: BoardSummary::from_board(board),
            timeout_warning: stats.timed_out_share > TIMEOUT_WARN_SHARE,
            stats,
        }
    }
}

/// Tiles at or above `threshold`, heaviest first, ties in board order.
#[must_use]
pub fn heavy_tiles(probe: &[TileDrinkAverage], threshold: f64) -> Vec<TileDrinkAverage> {
    let mut heavy: Vec<TileDrinkAverage> = probe
        .iter()
        .filter(|t| t.avg_drinks >= threshold)
        .cloned()
        .collect();
    heavy.sort_by(|a, b| {
        b.avg_drinks
            .total_cmp(&a.avg_drinks)
            .then_with(|| a.index.cmp(&b.index))
    });
    heavy
}
