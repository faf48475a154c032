//! Batch aggregation: mergeable raw samples and their finalized summaries.
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::MilestoneSpec;
use crate::game::GameResult;
use crate::numbers::{ceil_f64_to_usize, count_to_f64, ratio, u64_to_f64};

/// Distribution summary of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: u32,
    pub p10: u32,
    pub p50: u32,
    pub p90: u32,
    pub max: u32,
}

impl Summary {
    /// Summarise `values`; an empty slice yields all zeros.
    #[must_use]
    pub fn from_values(values: &[u32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let count = count_to_f64(sorted.len());
        let total: u64 = sorted.iter().map(|&v| u64::from(v)).sum();
        let mean = u64_to_f64(total) / count;
        let variance = if sorted.len() > 1 {
            sorted
                .iter()
                .map(|&v| {
                    let delta = f64::from(v) - mean;
                    delta * delta
                })
                .sum::<f64>()
                / (count - 1.0)
        } else {
            0.0
        };

        Self {
            mean,
            std_dev: variance.sqrt(),
            min: sorted[0],
            p10: nearest_rank(&sorted, 10.0),
            p50: nearest_rank(&sorted, 50.0),
            p90: nearest_rank(&sorted, 90.0),
            max: sorted[sorted.len() - 1],
        }
    }
}

/// Nearest-rank percentile of an ascending slice: rank ⌈p/100 · n⌉, 1-based.
#[must_use]
pub fn nearest_rank(sorted: &[u32], percentile: f64) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ceil_f64_to_usize(percentile * count_to_f64(sorted.len()) / 100.0);
    let rank = rank.clamp(1, sorted.len());
    sorted[rank - 1]
}

/// Player and game counts for one milestone flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MilestoneCount {
    pub players: u64,
    pub games: u64,
}

/// Finalized milestone rates, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneRate {
    pub flag: String,
    pub label: String,
    pub player_pct: f64,
    pub game_pct: f64,
}

/// Raw per-game and per-player samples; merge order never changes the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAggregate {
    rounds: Vec<u32>,
    drinks: Vec<u32>,
    turns: Vec<u32>,
    tiles: Vec<u32>,
    milestones: BTreeMap<String, MilestoneCount>,
    timed_out: u64,
}

impl BatchAggregate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &GameResult, milestones: &[MilestoneSpec]) {
        self.rounds.push(result.rounds);
        for player in &result.players {
            self.drinks.push(player.drinks);
            self.turns.push(player.turns);
            self.tiles.push(player.tiles_landed);
        }
        for milestone in milestones {
            let hits = result
                .players
                .iter()
                .filter(|p| p.flags.has(&milestone.flag))
                .count();
            let entry = self.milestones.entry(milestone.flag.clone()).or_default();
            entry.players += u64::try_from(hits).unwrap_or(u64::MAX);
            if hits > 0 {
                entry.games += 1;
            }
        }
        if result.timed_out {
            self.timed_out += 1;
        }
    }

    /// Fold another partial aggregate into this one.
    pub fn merge(&mut self, other: Self) {
        self.rounds.extend(other.rounds);
        self.drinks.extend(other.drinks);
        self.turns.extend(other.turns);
        self.tiles.extend(other.tiles);
        for (flag, count) in other.milestones {
            let entry = self.milestones.entry(flag).or_default();
            entry.players += count.players;
            entry.games += count.games;
        }
        self.timed_out += other.timed_out;
    }

    #[must_use]
    pub fn games(&self) -> usize {
        self.rounds.len()
    }

    #[must_use]
    pub fn players(&self) -> usize {
        self.drinks.len()
    }

    #[must_use]
    pub const fn timed_out(&self) -> u64 {
        self.timed_out
    }

    #[must_use]
    pub fn milestone(&self, flag: &str) -> MilestoneCount {
        self.milestones.get(flag).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn finish(&self, milestones: &[MilestoneSpec]) -> BatchStats {
        let games = self.games();
        let players = self.players();
        let timed_out = usize::try_from(self.timed_out).unwrap_or(usize::MAX);
        BatchStats {
            games,
            players,
            rounds: Summary::from_values(&self.rounds),
            drinks: Summary::from_values(&self.drinks),
            turns: Summary::from_values(&self.turns),
            tiles_landed: Summary::from_values(&self.tiles),
            milestones: milestones
                .iter()
                .map(|spec| {
                    let count = self.milestone(&spec.flag);
                    MilestoneRate {
                        flag: spec.flag.clone(),
                        label: spec.label.clone(),
                        player_pct: percent(count.players, players),
                        game_pct: percent(count.games, games),
                    }
                })
                .collect(),
            timed_out: self.timed_out,
            timed_out_share: ratio(timed_out, games),
        }
    }
}

fn percent(hits: u64, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    u64_to_f64(hits) / count_to_f64(total) * 100.0
}

/// Finalized statistics for a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    pub games: usize,
    pub players: usize,
    pub rounds: Summary,
    pub drinks: Summary,
    pub turns: Summary,
    pub tiles_landed: Summary,
    pub milestones: Vec<MilestoneRate>,
    pub timed_out: u64,
    pub timed_out_share: f64,
}
