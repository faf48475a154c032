//! Sipboard Simulation Engine
//!
//! Monte Carlo engine for a Kanto-themed drinking board game: combat
//! resolution, tile effects, turn handling and batch statistics. The crate
//! performs no I/O; boards and configs arrive as strings or raw tiles.

pub mod board;
pub mod config;
pub mod constants;
pub mod effects;
pub mod game;
pub mod gym;
pub mod numbers;
pub mod player;
pub mod report;
pub mod seed;
pub mod simulation;
pub mod stats;

// Re-export commonly used types
pub use board::{Board, BoardError, BoardSection, LoopZone, RawTile, TileCategory, TileDescriptor};
pub use config::{ConfigError, MilestoneSpec, SimConfig};
pub use effects::{EffectDispatcher, EffectRule, EffectTable, TileEffect, TileKey};
pub use game::{GameResult, GameRules, GameRunner, run_game};
pub use gym::{CombatCache, CombatOutcomeSample, GymCatalog, GymRule, GymSummary, resolve_duel};
pub use player::{PlayerFlags, PlayerState, TurnPhase};
pub use report::{BoardSummary, Headline, SectionReport, SimulationReport, TileDrinkAverage};
pub use seed::RngStreams;
pub use simulation::{Simulation, run_simulation};
pub use stats::{BatchAggregate, BatchStats, MilestoneRate, Summary};

/// Trait for abstracting where tile definitions come from.
/// Front-ends provide implementations for files, embedded data or tests.
pub trait TileSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw tile list in board order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile data cannot be read or decoded.
    fn load_tiles(&self) -> Result<Vec<RawTile>, Self::Error>;

    /// Load and validate a board.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or no usable tile remains.
    fn load_board(&self) -> Result<Board, Self::Error>
    where
        Self::Error: From<BoardError>,
    {
        Ok(Board::from_raw(self.load_tiles()?)?)
    }
}

/// Tile source backed by a `{ "tiles": [...] }` JSON document.
#[derive(Debug, Clone)]
pub struct JsonTileSource {
    json: String,
}

impl JsonTileSource {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }

    /// The Kanto board shipped with the crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self::new(board::BUNDLED_BOARD_JSON)
    }
}

impl TileSource for JsonTileSource {
    type Error = BoardError;

    fn load_tiles(&self) -> Result<Vec<RawTile>, Self::Error> {
        board::parse_raw_tiles(&self.json)
    }
}
