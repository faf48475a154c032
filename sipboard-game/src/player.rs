//! Per-player state and the turn phase it implies.
use serde::Serialize;
use std::collections::BTreeSet;

/// Cross-tile memory owned by one player for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerFlags {
    markers: BTreeSet<String>,
    completed_gyms: BTreeSet<usize>,
}

impl PlayerFlags {
    #[must_use]
    pub fn has(&self, flag: &str) -> bool {
        self.markers.contains(flag)
    }

    pub fn set(&mut self, flag: &str) {
        if !self.markers.contains(flag) {
            self.markers.insert(flag.to_string());
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }

    #[must_use]
    pub fn has_completed_gym(&self, tile: usize) -> bool {
        self.completed_gyms.contains(&tile)
    }

    /// Record a cleared gym; returns `false` when it was already recorded.
    pub fn complete_gym(&mut self, tile: usize) -> bool {
        self.completed_gyms.insert(tile)
    }

    #[must_use]
    pub fn completed_gyms(&self) -> &BTreeSet<usize> {
        &self.completed_gyms
    }
}

/// Where a player stands in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnPhase {
    /// Rolls and moves on their next turn.
    Active,
    /// Owes turns; the next turn is spent in place.
    Skipping,
    /// Reached the last tile; ignored for the rest of the game.
    Finished,
}

/// Mutable record of one player's progress through a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerState {
    pub position: usize,
    pub drinks: u32,
    pub turns: u32,
    pub tiles_landed: u32,
    pub lost_turns: u32,
    pub flags: PlayerFlags,
    pub finished: bool,
}

impl PlayerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        if self.finished {
            TurnPhase::Finished
        } else if self.lost_turns > 0 {
            TurnPhase::Skipping
        } else {
            TurnPhase::Active
        }
    }

    /// Spend one owed turn in place. Returns `false` if nothing was owed.
    pub fn skip_turn(&mut self) -> bool {
        if self.finished || self.lost_turns == 0 {
            return false;
        }
        self.lost_turns -= 1;
        self.turns = self.turns.saturating_add(1);
        true
    }

    pub fn add_drinks(&mut self, drinks: u32) {
        self.drinks = self.drinks.saturating_add(drinks);
    }

    pub fn add_lost_turns(&mut self, turns: u32) {
        if !self.finished {
            self.lost_turns = self.lost_turns.saturating_add(turns);
        }
    }

    /// Move onto `position`, clamping at `last_index` and finishing there.
    pub fn land_on(&mut self, position: usize, last_index: usize) {
        if self.finished {
            return;
        }
        if position >= last_index {
            self.position = last_index;
            self.finished = true;
            self.lost_turns = 0;
        } else {
            self.position = position;
        }
        self.tiles_landed = self.tiles_landed.saturating_add(1);
    }

    /// Step back `spaces`, never past the start; finished players stay put.
    pub fn move_back(&mut self, spaces: u32) {
        if self.finished || spaces == 0 {
            return;
        }
        let spaces = usize::try_from(spaces).unwrap_or(usize::MAX);
        self.position = self.position.saturating_sub(spaces);
    }
}
