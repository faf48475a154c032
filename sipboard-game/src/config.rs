//! Simulation parameters, loaded from JSON with every field defaulted.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::{FOSSIL_FLAG, UPGRADE_FLAG};

/// A player flag whose achievement rate is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSpec {
    pub flag: String,
    pub label: String,
}

impl MilestoneSpec {
    #[must_use]
    pub fn new(flag: &str, label: &str) -> Self {
        Self {
            flag: flag.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("milestone #{index} has an empty flag")]
    EmptyMilestone { index: usize },
}

/// Batch configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default = "SimConfig::default_games")]
    pub games: u32,
    #[serde(default = "SimConfig::default_players")]
    pub players: u32,
    #[serde(default = "SimConfig::default_combat_samples")]
    pub combat_samples: u32,
    #[serde(default = "SimConfig::default_optional_stop_chance")]
    pub optional_stop_chance: f64,
    #[serde(default = "SimConfig::default_loop_roll_threshold")]
    pub loop_roll_threshold: u32,
    #[serde(default = "SimConfig::default_loop_penalty")]
    pub loop_penalty: u32,
    #[serde(default = "SimConfig::default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "SimConfig::default_seed")]
    pub seed: u64,
    #[serde(default = "SimConfig::default_tile_probe_samples")]
    pub tile_probe_samples: u32,
    #[serde(default = "SimConfig::default_heavy_tile_threshold")]
    pub heavy_tile_threshold: f64,
    #[serde(default = "SimConfig::default_loop_zones")]
    pub loop_zones: Vec<String>,
    #[serde(default = "SimConfig::default_milestones")]
    pub milestones: Vec<MilestoneSpec>,
}

impl SimConfig {
    const fn default_games() -> u32 {
        50_000
    }

    const fn default_players() -> u32 {
        4
    }

    const fn default_combat_samples() -> u32 {
        10_000
    }

    const fn default_optional_stop_chance() -> f64 {
        0.4
    }

    const fn default_loop_roll_threshold() -> u32 {
        5
    }

    const fn default_loop_penalty() -> u32 {
        1
    }

    const fn default_max_rounds() -> u32 {
        200
    }

    const fn default_seed() -> u64 {
        42
    }

    const fn default_tile_probe_samples() -> u32 {
        1_000
    }

    const fn default_heavy_tile_threshold() -> f64 {
        2.0
    }

    fn default_loop_zones() -> Vec<String> {
        vec!["viridian_forest".to_string()]
    }

    fn default_milestones() -> Vec<MilestoneSpec> {
        vec![
            MilestoneSpec::new(FOSSIL_FLAG, "Fossil"),
            MilestoneSpec::new(UPGRADE_FLAG, "Upgrade"),
        ]
    }

    /// Parse a config document; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or the first
    /// validation failure.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its documented bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        min_count("games", self.games, 1)?;
        min_count("players", self.players, 1)?;
        min_count("combat_samples", self.combat_samples, 1)?;
        min_count("max_rounds", self.max_rounds, 1)?;
        min_count("tile_probe_samples", self.tile_probe_samples, 1)?;
        if !(0.0..=1.0).contains(&self.optional_stop_chance) {
            return Err(ConfigError::RangeViolation {
                field: "optional_stop_chance",
                min: 0.0,
                max: 1.0,
                value: self.optional_stop_chance,
            });
        }
        if !(1..=6).contains(&self.loop_roll_threshold) {
            return Err(ConfigError::RangeViolation {
                field: "loop_roll_threshold",
                min: 1.0,
                max: 6.0,
                value: f64::from(self.loop_roll_threshold),
            });
        }
        if !self.heavy_tile_threshold.is_finite() || self.heavy_tile_threshold < 0.0 {
            return Err(ConfigError::RangeViolation {
                field: "heavy_tile_threshold",
                min: 0.0,
                max: f64::MAX,
                value: self.heavy_tile_threshold,
            });
        }
        if let Some(index) = self.milestones.iter().position(|m| m.flag.trim().is_empty()) {
            return Err(ConfigError::EmptyMilestone { index });
        }
        Ok(())
    }
}

fn min_count(field: &'static str, value: u32, min: u32) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::MinViolation {
            field,
            min: u64::from(min),
            value: u64::from(value),
        });
    }
    Ok(())
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            games: Self::default_games(),
            players: Self::default_players(),
            combat_samples: Self::default_combat_samples(),
            optional_stop_chance: Self::default_optional_stop_chance(),
            loop_roll_threshold: Self::default_loop_roll_threshold(),
            loop_penalty: Self::default_loop_penalty(),
            max_rounds: Self::default_max_rounds(),
            seed: Self::default_seed(),
            tile_probe_samples: Self::default_tile_probe_samples(),
            heavy_tile_threshold: Self::default_heavy_tile_threshold(),
            loop_zones: Self::default_loop_zones(),
            milestones: Self::default_milestones(),
        }
    }
}
