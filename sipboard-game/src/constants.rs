//! Tunable constants shared across the simulation engine.

/// Faces on the movement and combat dice.
pub const DIE_FACES: u8 = 6;

/// Dice thrown by the challenger in each duel round.
pub const DUEL_DICE: usize = 3;

/// Dice thrown per round of the Elite Four gauntlet.
pub const GAUNTLET_DICE: usize = 4;

/// Score bonus for a split that wins the duel outright.
pub const DUEL_WIN_BONUS: u32 = 1_000;

/// Weight applied to the defense die when no split wins outright.
pub const DUEL_DEFENSE_WEIGHT: u32 = 3;

/// Hard ceiling on rounds inside a single duel.
pub const DUEL_ROUND_CAP: u32 = 1_000;

/// Hard ceiling on attempts while precomputing one gym outcome.
pub const GYM_ATTEMPT_CAP: u32 = 500;

/// Games per shard; each shard is aggregated separately and merged.
pub const SHARD_SIZE: u32 = 10_000;

/// Text marker for tiles whose effect repeats while a player is stuck on them.
pub const START_OF_TURN_MARKER: &str = "start of turn";

/// Background category for gym tiles.
pub const GYM_BACKGROUND: &str = "gym";

/// Background category for optional stop tiles.
pub const OPTIONAL_STOP_BACKGROUND: &str = "optional_stop";

/// Background categories that mark a tile as a member of a named zone.
pub const ZONE_BACKGROUNDS: [&str; 6] = [
    "viridian_forest",
    "rock_tunnel",
    "pokemon_tower",
    "silph_co",
    "safari_zone",
    "seafoam_islands",
];

/// Sips in one beer, used for the headline conversion.
pub const SIPS_PER_BEER: f64 = 10.0;

/// Multiplier estimating drinks handed out to others on top of direct drinks.
pub const COLLATERAL_FACTOR: f64 = 1.3;

/// Minutes a single round takes at the table, lower and upper estimate.
pub const MINUTES_PER_ROUND: (f64, f64) = (2.0, 3.0);

/// Share of timed-out games above which the report raises a warning.
pub const TIMEOUT_WARN_SHARE: f64 = 0.005;

/// Heavy tiles listed per board section.
pub const SECTION_HEAVY_LIMIT: usize = 4;

/// Heavy tiles listed in the global ranking.
pub const GLOBAL_HEAVY_LIMIT: usize = 15;
