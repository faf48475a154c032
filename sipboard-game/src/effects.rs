//! Per-tile effects: the rule table and the dispatcher that applies it.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, TileDescriptor};
use crate::gym::{CombatCache, roll_die};
use crate::player::PlayerFlags;

pub const FOSSIL_FLAG: &str = "has_fossil";
pub const UPGRADE_FLAG: &str = "has_upgrade";
pub const ROCKET_FLAG: &str = "met_rocket";

/// Consequences of landing on a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TileEffect {
    pub drinks: u32,
    pub extra_turns: u32,
    pub lost_turns: u32,
    pub move_back: u32,
}

impl TileEffect {
    #[must_use]
    pub const fn drinks(drinks: u32) -> Self {
        Self {
            drinks,
            extra_turns: 0,
            lost_turns: 0,
            move_back: 0,
        }
    }
}

/// How a table entry selects tiles. Keys are compared lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum TileKey {
    Name(String),
    NameContains(String),
    HeaderContains(String),
}

impl TileKey {
    fn matches(&self, name: &str, header: &str) -> bool {
        match self {
            Self::Name(key) => name == key,
            Self::NameContains(key) => name.contains(key.as_str()),
            Self::HeaderContains(key) => header.contains(key.as_str()),
        }
    }
}

/// A small effect program; every roll comes from the caller's RNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectRule {
    Drinks { drinks: u32 },
    ExtraTurns { turns: u32 },
    LoseTurns { turns: u32 },
    DrinksAndFlag { drinks: u32, flag: String },
    /// Drink a d6, halved (rounding up) when the tile text says so.
    Rival,
    /// Lose ⌈d6/2⌉ turns and drink that many times a second d6.
    Voyage,
    DieRoll,
    /// A low roll is drunk and walked back.
    Knockback { max_roll: u32 },
    /// Keep rolling while even, drinking `per_even` each time.
    EvenStreak { per_even: u32 },
    /// Count one plus every even roll; only a chain longer than one is drunk.
    EvenChain,
    /// Costs more for players who already carry `flag`.
    Repeat { first: u32, repeat: u32, flag: String },
    Upgrade { requires: String, grants: String },
    Volatile {
        threshold: u32,
        high: u32,
        low: u32,
        knockback: u32,
    },
    DrinksAndBack { drinks: u32, back: u32 },
    Nothing,
}

impl EffectRule {
    pub fn apply<R: Rng + ?Sized>(
        &self,
        tile: &TileDescriptor,
        flags: &mut PlayerFlags,
        rng: &mut R,
    ) -> TileEffect {
        match self {
            Self::Drinks { drinks } => TileEffect::drinks(*drinks),
            Self::ExtraTurns { turns } => TileEffect {
                extra_turns: *turns,
                ..TileEffect::default()
            },
            Self::LoseTurns { turns } => TileEffect {
                lost_turns: *turns,
                ..TileEffect::default()
            },
            Self::DrinksAndFlag { drinks, flag } => {
                flags.set(flag);
                TileEffect::drinks(*drinks)
            }
            Self::Rival => {
                let roll = roll_die(rng);
                if tile.text.to_lowercase().contains("half") {
                    TileEffect::drinks(roll.div_ceil(2))
                } else {
                    TileEffect::drinks(roll)
                }
            }
            Self::Voyage => {
                let turns = (roll_die(rng) + 1) / 2;
                TileEffect {
                    drinks: turns * roll_die(rng),
                    lost_turns: turns,
                    ..TileEffect::default()
                }
            }
            Self::DieRoll => TileEffect::drinks(roll_die(rng)),
            Self::Knockback { max_roll } => {
                let roll = roll_die(rng);
                if roll <= *max_roll {
                    TileEffect {
                        drinks: roll,
                        move_back: roll,
                        ..TileEffect::default()
                    }
                } else {
                    TileEffect::default()
                }
            }
            Self::EvenStreak { per_even } => {
                let mut drinks = 0_u32;
                while roll_die(rng) % 2 == 0 {
                    drinks = drinks.saturating_add(*per_even);
                }
                TileEffect::drinks(drinks)
            }
            Self::EvenChain => {
                let mut count = 1_u32;
                while roll_die(rng) % 2 == 0 {
                    count += 1;
                }
                TileEffect::drinks(if count > 1 { count } else { 0 })
            }
            Self::Repeat {
                first,
                repeat,
                flag,
            } => {
                let drinks = if flags.has(flag) { *repeat } else { *first };
                flags.set(flag);
                TileEffect::drinks(drinks)
            }
            Self::Upgrade { requires, grants } => {
                if flags.has(requires) {
                    flags.set(grants);
                }
                TileEffect::default()
            }
            Self::Volatile {
                threshold,
                high,
                low,
                knockback,
            } => {
                if roll_die(rng) >= *threshold {
                    TileEffect {
                        drinks: *high,
                        move_back: *knockback,
                        ..TileEffect::default()
                    }
                } else {
                    TileEffect::drinks(*low)
                }
            }
            Self::DrinksAndBack { drinks, back } => TileEffect {
                drinks: *drinks,
                move_back: *back,
                ..TileEffect::default()
            },
            Self::Nothing => TileEffect::default(),
        }
    }
}

/// Ordered rule table; the first entry whose key matches a tile wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EffectTableData")]
pub struct EffectTable {
    entries: Vec<(TileKey, EffectRule)>,
}

/// Wire shape of [`EffectTable`]; decoding goes through [`EffectTable::new`].
#[derive(Deserialize)]
struct EffectTableData {
    entries: Vec<(TileKey, EffectRule)>,
}

impl From<EffectTableData> for EffectTable {
    fn from(data: EffectTableData) -> Self {
        Self::new(data.entries)
    }
}

impl EffectTable {
    #[must_use]
    pub fn new(entries: Vec<(TileKey, EffectRule)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, rule)| (lowercase_key(key), rule))
            .collect();
        Self { entries }
    }

    /// Position of the first entry that applies to `tile`.
    #[must_use]
    pub fn position_for(&self, tile: &TileDescriptor) -> Option<usize> {
        let name = tile.name.to_lowercase();
        let header = tile.header.to_lowercase();
        self.entries
            .iter()
            .position(|(key, _)| key.matches(&name, &header))
    }

    #[must_use]
    pub fn rule_for(&self, tile: &TileDescriptor) -> Option<&EffectRule> {
        self.position_for(tile)
            .and_then(|index| self.entries.get(index))
            .map(|(_, rule)| rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn lowercase_key(key: TileKey) -> TileKey {
    match key {
        TileKey::Name(value) => TileKey::Name(value.to_lowercase()),
        TileKey::NameContains(value) => TileKey::NameContains(value.to_lowercase()),
        TileKey::HeaderContains(value) => TileKey::HeaderContains(value.to_lowercase()),
    }
}

impl Default for EffectTable {
    fn default() -> Self {
        use EffectRule as R;
        use TileKey as K;

        let name = |n: &str| K::Name(n.to_string());
        let header = |h: &str| K::HeaderContains(h.to_string());
        let drinks = |d: u32| R::Drinks { drinks: d };
        let lose = R::LoseTurns { turns: 1 };

        Self::new(vec![
            (name("rattata"), drinks(10)),
            (name("pidgey"), R::ExtraTurns { turns: 1 }),
            (name("weedle"), drinks(2)),
            (name("metapod"), drinks(2)),
            (
                name("super nerd"),
                R::DrinksAndFlag {
                    drinks: 2,
                    flag: FOSSIL_FLAG.to_string(),
                },
            ),
            (name("poke mart"), drinks(3)),
            (K::NameContains("gary".to_string()), R::Rival),
            (header("poke center"), drinks(2)),
            (header("ss anne"), R::Voyage),
            (header("stadium"), drinks(2)),
            (name("tentacool"), drinks(3)),
            (name("spearow"), lose.clone()),
            (name("zubat"), drinks(1)),
            (name("cubone"), drinks(1)),
            (name("geodude"), R::DieRoll),
            (name("diglett"), drinks(5)),
            (name("machoke"), R::Knockback { max_roll: 4 }),
            (name("channeler"), drinks(1)),
            (name("gastly"), R::EvenStreak { per_even: 2 }),
            (name("haunter"), drinks(3)),
            (name("hypno"), drinks(2)),
            (name("snorlax"), drinks(2)),
            (name("mr_mime"), drinks(2)),
            (header("saffron city"), drinks(2)),
            (name("magneton"), drinks(2)),
            (name("porygon"), drinks(2)),
            (
                K::NameContains("team_rocket".to_string()),
                R::Repeat {
                    first: 3,
                    repeat: 6,
                    flag: ROCKET_FLAG.to_string(),
                },
            ),
            (name("tauros"), drinks(2)),
            (name("scyther"), drinks(5)),
            (name("kangaskhan"), drinks(3)),
            (name("muk"), drinks(5)),
            (name("dewgong"), drinks(1)),
            (name("goldduck"), R::EvenChain),
            (name("articuno"), lose.clone()),
            (
                header("cinnabar lab"),
                R::Upgrade {
                    requires: FOSSIL_FLAG.to_string(),
                    grants: UPGRADE_FLAG.to_string(),
                },
            ),
            (
                name("pokemon_lab"),
                R::Upgrade {
                    requires: FOSSIL_FLAG.to_string(),
                    grants: UPGRADE_FLAG.to_string(),
                },
            ),
            (
                name("electrode"),
                R::Volatile {
                    threshold: 5,
                    high: 10,
                    low: 2,
                    knockback: 1,
                },
            ),
            (name("golem"), R::DrinksAndBack { drinks: 2, back: 2 }),
            (name("zapdos"), drinks(3)),
            (name("dragonite"), lose),
            (name("gyarados"), drinks(5)),
            (name("moltres"), R::Nothing),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Gym,
    Rule(usize),
    Unmatched,
}

/// Applies tile effects for one board: gyms draw from the combat cache,
/// everything else goes through the rule table.
#[derive(Debug, Clone)]
pub struct EffectDispatcher {
    table: EffectTable,
    cache: CombatCache,
    bindings: Vec<Binding>,
}

impl EffectDispatcher {
    /// Bind every tile of `board` to its rule once, up front.
    #[must_use]
    pub fn new(board: &Board, table: EffectTable, cache: CombatCache) -> Self {
        let bindings = board
            .tiles()
            .iter()
            .map(|tile| {
                if tile.is_gym() {
                    Binding::Gym
                } else {
                    table.position_for(tile).map_or(Binding::Unmatched, Binding::Rule)
                }
            })
            .collect::<Vec<_>>();
        let unmatched = bindings.iter().filter(|b| **b == Binding::Unmatched).count();
        log::debug!(
            "bound {} tiles to effects, {unmatched} without a rule",
            bindings.len()
        );
        Self {
            table,
            cache,
            bindings,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &CombatCache {
        &self.cache
    }

    #[must_use]
    pub fn table(&self) -> &EffectTable {
        &self.table
    }

    /// Resolve landing on `tile`, mutating the player's flags as the rule demands.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        tile: &TileDescriptor,
        flags: &mut PlayerFlags,
        rng: &mut R,
    ) -> TileEffect {
        match self.bindings.get(tile.index).copied() {
            Some(Binding::Gym) => self
                .cache
                .sample(tile.index, rng)
                .map_or_else(TileEffect::default, |outcome| TileEffect {
                    drinks: outcome.drinks,
                    lost_turns: outcome.rounds.saturating_sub(1),
                    ..TileEffect::default()
                }),
            Some(Binding::Rule(index)) => self
                .table
                .entries
                .get(index)
                .map_or_else(TileEffect::default, |(_, rule)| {
                    rule.apply(tile, flags, rng)
                }),
            Some(Binding::Unmatched) | None => TileEffect::default(),
        }
    }
}
