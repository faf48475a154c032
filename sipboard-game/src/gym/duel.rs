use rand::Rng;
use smallvec::SmallVec;

use crate::constants::{DIE_FACES, DUEL_DEFENSE_WEIGHT, DUEL_DICE, DUEL_ROUND_CAP, DUEL_WIN_BONUS};

/// Dice from one throw, highest first.
pub type DiceThrow = SmallVec<[u32; 4]>;

/// Result of a single duel between a challenger and a gym.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelOutcome {
    pub rounds: u32,
    pub challenger_won: bool,
}

/// How the challenger assigned a throw between attack and defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceSplit {
    pub attack: u32,
    pub defense: u32,
}

/// Roll a single die in `1..=6`.
pub fn roll_die<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(1..=u32::from(DIE_FACES))
}

/// Roll `count` dice and sort them highest first.
pub fn roll_sorted<R: Rng + ?Sized>(rng: &mut R, count: usize) -> DiceThrow {
    let mut dice: DiceThrow = (0..count).map(|_| roll_die(rng)).collect();
    dice.sort_unstable_by(|a, b| b.cmp(a));
    dice
}

/// Pick the split of a sorted throw that maximises the challenger's score.
///
/// The first `a` dice feed the attack, the rest feed the defense; each side
/// uses its highest die. Ties keep the smallest `a`.
#[must_use]
pub fn choose_split(dice: &[u32], remaining_hp: u32) -> DiceSplit {
    let mut best = DiceSplit {
        attack: 0,
        defense: 0,
    };
    let mut best_score: Option<u32> = None;
    for split in 0..=dice.len() {
        let attack = dice[..split].iter().copied().max().unwrap_or(0);
        let defense = dice[split..].iter().copied().max().unwrap_or(0);
        let score = if attack >= remaining_hp {
            DUEL_WIN_BONUS + defense
        } else {
            DUEL_DEFENSE_WEIGHT * defense + attack
        };
        if best_score.is_none_or(|current| score > current) {
            best_score = Some(score);
            best = DiceSplit { attack, defense };
        }
    }
    best
}

/// Fight a gym until someone breaks.
///
/// The challenger wins once a round's attack die reaches the gym's remaining
/// hp. Otherwise the attack is subtracted from the hp, and the gym wins the
/// duel if its attack beats the challenger's defense die.
pub fn resolve_duel<R: Rng + ?Sized>(gym_attack: u32, gym_hp: u32, rng: &mut R) -> DuelOutcome {
    let mut remaining_hp = gym_hp;
    for round in 1..=DUEL_ROUND_CAP {
        let dice = roll_sorted(rng, DUEL_DICE);
        let split = choose_split(&dice, remaining_hp);
        if split.attack >= remaining_hp {
            return DuelOutcome {
                rounds: round,
                challenger_won: true,
            };
        }
        remaining_hp = remaining_hp.saturating_sub(split.attack);
        if gym_attack > split.defense {
            return DuelOutcome {
                rounds: round,
                challenger_won: false,
            };
        }
    }
    log::debug!("duel hit the {DUEL_ROUND_CAP}-round cap (attack {gym_attack}, hp {gym_hp})");
    DuelOutcome {
        rounds: DUEL_ROUND_CAP,
        challenger_won: true,
    }
}
