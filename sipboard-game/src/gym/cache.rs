use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{CombatOutcomeSample, GymCatalog};
use crate::board::Board;
use crate::numbers::{count_to_f64, u64_to_f64};

/// Average cost of one gym, computed from its outcome pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GymSummary {
    pub tile: usize,
    pub label: String,
    pub avg_drinks: f64,
    pub avg_rounds: f64,
}

#[derive(Debug, Clone)]
struct GymPool {
    label: String,
    samples: Vec<CombatOutcomeSample>,
}

impl GymPool {
    fn summary(&self, tile: usize) -> GymSummary {
        let count = count_to_f64(self.samples.len().max(1));
        let drinks: u64 = self.samples.iter().map(|s| u64::from(s.drinks)).sum();
        let rounds: u64 = self.samples.iter().map(|s| u64::from(s.rounds)).sum();
        GymSummary {
            tile,
            label: self.label.clone(),
            avg_drinks: u64_to_f64(drinks) / count,
            avg_rounds: u64_to_f64(rounds) / count,
        }
    }
}

/// Empirical outcome tables per gym tile, built once before the main loop.
#[derive(Debug, Clone, Default)]
pub struct CombatCache {
    pools: BTreeMap<usize, GymPool>,
}

impl CombatCache {
    /// Precompute `samples` outcomes for every gym on the board.
    pub fn build<R: Rng + ?Sized>(
        board: &Board,
        catalog: &GymCatalog,
        samples: usize,
        rng: &mut R,
    ) -> Self {
        let mut pools = BTreeMap::new();
        for &gym in board.gyms() {
            let Some(tile) = board.tile(gym) else {
                continue;
            };
            let label = tile.label().to_string();
            let rule = catalog.rule_for(&tile.header);
            if matches!(rule, super::GymRule::Unknown) {
                log::warn!("no combat rule for gym '{label}' (tile #{}), using a free pass", gym + 1);
            }
            let pool = GymPool {
                label,
                samples: (0..samples).map(|_| rule.sample_outcome(rng)).collect(),
            };
            let summary = pool.summary(gym);
            log::debug!(
                "{}: avg {:.1} drinks, {:.1} rounds",
                summary.label,
                summary.avg_drinks,
                summary.avg_rounds
            );
            pools.insert(gym, pool);
        }
        Self { pools }
    }

    /// Draw one outcome uniformly (with replacement) from the gym's pool.
    pub fn sample<R: Rng + ?Sized>(&self, tile: usize, rng: &mut R) -> Option<CombatOutcomeSample> {
        let pool = self.pools.get(&tile)?;
        if pool.samples.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..pool.samples.len());
        pool.samples.get(index).copied()
    }

    #[must_use]
    pub fn pool(&self, tile: usize) -> Option<&[CombatOutcomeSample]> {
        self.pools.get(&tile).map(|pool| pool.samples.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Per-gym averages in board order.
    #[must_use]
    pub fn summaries(&self) -> Vec<GymSummary> {
        self.pools
            .iter()
            .map(|(&tile, pool)| pool.summary(tile))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::RawTile;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn gym_board() -> Board {
        Board::from_raw(vec![
            RawTile::named("Start"),
            RawTile::default().with_header("Pewter Gym").with_background("gym"),
            RawTile::named("rattata"),
            RawTile::default().with_header("Champion").with_background("gym"),
        ])
        .unwrap()
    }

    #[test]
    fn builds_one_pool_per_gym() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let cache = CombatCache::build(&gym_board(), &GymCatalog::default(), 200, &mut rng);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.pool(1).map(<[_]>::len), Some(200));
        assert!(cache.pool(2).is_none());
        assert!(cache.sample(0, &mut rng).is_none());
    }

    #[test]
    fn samples_come_from_the_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let cache = CombatCache::build(&gym_board(), &GymCatalog::default(), 100, &mut rng);
        let pool = cache.pool(1).unwrap().to_vec();
        for _ in 0..200 {
            let drawn = cache.sample(1, &mut rng).unwrap();
            assert!(pool.contains(&drawn));
        }
        assert_eq!(
            cache.sample(3, &mut rng),
            Some(CombatOutcomeSample {
                drinks: 10,
                rounds: 1
            })
        );
    }

    #[test]
    fn pewter_pool_is_reproducible_per_seed() {
        let board = gym_board();
        let build = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            CombatCache::build(&board, &GymCatalog::default(), 500, &mut rng)
                .pool(1)
                .unwrap()
                .to_vec()
        };
        assert_eq!(build(42), build(42));
        assert_ne!(build(42), build(43));
    }

    #[test]
    fn summaries_follow_board_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let cache = CombatCache::build(&gym_board(), &GymCatalog::default(), 50, &mut rng);
        let summaries = cache.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].label, "Pewter Gym");
        assert_eq!(summaries[1].label, "Champion");
        assert!((summaries[1].avg_drinks - 10.0).abs() < f64::EPSILON);
        assert!(summaries[0].avg_rounds >= 1.0);
    }
}
