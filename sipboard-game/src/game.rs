//! Board traversal: one complete game from the start tile to the finish.
use rand::Rng;
use serde::Serialize;

use crate::board::{Board, LoopZone, TileDescriptor};
use crate::config::SimConfig;
use crate::constants::START_OF_TURN_MARKER;
use crate::effects::{EffectDispatcher, TileEffect};
use crate::gym::roll_die;
use crate::player::{PlayerState, TurnPhase};

/// Movement and pacing rules for one batch, resolved against a board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRules {
    pub players: u32,
    pub optional_stop_chance: f64,
    pub loop_roll_threshold: u32,
    pub loop_penalty: u32,
    pub max_rounds: u32,
    pub loop_zones: Vec<LoopZone>,
}

impl GameRules {
    #[must_use]
    pub fn from_config(config: &SimConfig, board: &Board) -> Self {
        let loop_zones = board.loop_zones(&config.loop_zones);
        for name in &config.loop_zones {
            if !loop_zones.iter().any(|zone| &zone.name == name) {
                log::warn!("loop zone '{name}' has no tiles on this board");
            }
        }
        Self {
            players: config.players,
            optional_stop_chance: config.optional_stop_chance.clamp(0.0, 1.0),
            loop_roll_threshold: config.loop_roll_threshold,
            loop_penalty: config.loop_penalty,
            max_rounds: config.max_rounds,
            loop_zones,
        }
    }

    /// Stop chance usable as a probability; NaN counts as never stopping.
    #[must_use]
    pub fn stop_probability(&self) -> f64 {
        if self.optional_stop_chance.is_nan() {
            0.0
        } else {
            self.optional_stop_chance.clamp(0.0, 1.0)
        }
    }
}

/// Final state of a single game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub rounds: u32,
    pub players: Vec<PlayerState>,
    pub timed_out: bool,
}

/// Borrowed context for playing games on one board.
#[derive(Debug, Clone, Copy)]
pub struct GameRunner<'a> {
    board: &'a Board,
    dispatcher: &'a EffectDispatcher,
    rules: &'a GameRules,
}

impl<'a> GameRunner<'a> {
    #[must_use]
    pub const fn new(board: &'a Board, dispatcher: &'a EffectDispatcher, rules: &'a GameRules) -> Self {
        Self {
            board,
            dispatcher,
            rules,
        }
    }

    /// Play until every player finishes or the round cap is reached.
    pub fn play<R: Rng + ?Sized>(&self, rng: &mut R) -> GameResult {
        let seats = usize::try_from(self.rules.players).unwrap_or(0);
        let mut players = vec![PlayerState::new(); seats];
        let mut rounds = 0_u32;

        while rounds < self.rules.max_rounds && players.iter().any(|p| !p.finished) {
            rounds += 1;
            for player in &mut players {
                self.take_turn(player, rng);
            }
        }

        let timed_out = players.iter().any(|p| !p.finished);
        GameResult {
            rounds,
            players,
            timed_out,
        }
    }

    /// Run one seat's turn, including any extra turns it earns.
    pub fn take_turn<R: Rng + ?Sized>(&self, player: &mut PlayerState, rng: &mut R) {
        match player.phase() {
            TurnPhase::Finished => return,
            TurnPhase::Skipping => {
                player.skip_turn();
                if let Some(tile) = self.board.tile(player.position)
                    && repeats_at_turn_start(tile)
                {
                    let effect = self.dispatcher.resolve(tile, &mut player.flags, rng);
                    player.add_drinks(effect.drinks);
                }
                return;
            }
            TurnPhase::Active => {}
        }

        player.turns = player.turns.saturating_add(1);
        let roll = roll_die(rng);
        let destination = self.plan_move(player, roll, rng);
        let effect = self.land(player, destination, rng);

        for _ in 0..effect.extra_turns {
            if player.finished {
                break;
            }
            player.turns = player.turns.saturating_add(1);
            let bonus_roll = usize::try_from(roll_die(rng)).unwrap_or(0);
            let destination = player.position.saturating_add(bonus_roll);
            // Extra turns earned inside an extra turn are dropped.
            self.land(player, destination, rng);
        }
    }

    /// Apply gym stops, optional stops and loop zones to a tentative move.
    fn plan_move<R: Rng + ?Sized>(&self, player: &mut PlayerState, roll: u32, rng: &mut R) -> usize {
        let origin = player.position;
        let mut destination = origin.saturating_add(usize::try_from(roll).unwrap_or(0));

        if let Some(&gym) = self
            .board
            .gyms()
            .iter()
            .find(|&&g| origin < g && g <= destination && !player.flags.has_completed_gym(g))
        {
            destination = gym;
        }

        let stop_chance = self.rules.stop_probability();
        for &stop in self.board.optional_stops() {
            if origin < stop && stop < destination && rng.gen_bool(stop_chance) {
                destination = stop;
                break;
            }
        }

        if let Some(zone) = self
            .rules
            .loop_zones
            .iter()
            .find(|zone| zone.contains(destination))
            && destination != origin
            && roll >= self.rules.loop_roll_threshold
        {
            player.add_drinks(self.rules.loop_penalty);
            destination = zone.start;
        }

        destination
    }

    /// Move onto `destination`, resolve its tile and apply the result.
    fn land<R: Rng + ?Sized>(&self, player: &mut PlayerState, destination: usize, rng: &mut R) -> TileEffect {
        player.land_on(destination, self.board.last_index());
        let Some(tile) = self.board.tile(player.position) else {
            return TileEffect::default();
        };
        let effect = self.dispatcher.resolve(tile, &mut player.flags, rng);
        player.add_drinks(effect.drinks);
        player.add_lost_turns(effect.lost_turns);
        if tile.is_gym() {
            player.flags.complete_gym(tile.index);
        }
        player.move_back(effect.move_back);
        effect
    }
}

fn repeats_at_turn_start(tile: &TileDescriptor) -> bool {
    tile.text.to_lowercase().contains(START_OF_TURN_MARKER)
}

/// Play a single game with a freshly built runner.
pub fn run_game<R: Rng + ?Sized>(
    board: &Board,
    dispatcher: &EffectDispatcher,
    rules: &GameRules,
    rng: &mut R,
) -> GameResult {
    GameRunner::new(board, dispatcher, rules).play(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::RawTile;
    use crate::effects::{EffectRule, EffectTable, TileKey};
    use crate::gym::{CombatCache, GymCatalog};
    use crate::player::PlayerFlags;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rules(players: u32) -> GameRules {
        GameRules {
            players,
            optional_stop_chance: 0.4,
            loop_roll_threshold: 5,
            loop_penalty: 1,
            max_rounds: 200,
            loop_zones: Vec::new(),
        }
    }

    fn dispatcher_for(board: &Board, table: EffectTable) -> EffectDispatcher {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let cache = CombatCache::build(board, &GymCatalog::default(), 64, &mut rng);
        EffectDispatcher::new(board, table, cache)
    }

    fn plain_board(len: usize) -> Board {
        Board::from_raw((0..len).map(|i| RawTile::named(&format!("route {i}"))).collect()).unwrap()
    }

    #[test]
    fn single_player_finishes_when_rolls_reach_the_end() {
        let board = plain_board(10);
        let dispatcher = dispatcher_for(&board, EffectTable::default());
        let rules = rules(1);
        for seed in 0..200 {
            // Replay the movement rolls: the first k whose sum reaches tile 9.
            let mut replay = ChaCha8Rng::seed_from_u64(seed);
            let mut distance = 0_u32;
            let mut expected_turns = 0_u32;
            while distance < 9 {
                distance += replay.gen_range(1..=6_u32);
                expected_turns += 1;
            }

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = run_game(&board, &dispatcher, &rules, &mut rng);
            let player = &result.players[0];
            assert!(player.finished);
            assert!(!result.timed_out);
            assert_eq!(player.position, 9);
            assert_eq!(player.drinks, 0);
            assert_eq!(player.turns, expected_turns, "seed {seed}");
            assert_eq!(result.rounds, expected_turns);
            assert_eq!(player.tiles_landed, expected_turns);
        }
    }

    #[test]
    fn hand_built_stop_chances_are_sanitized() {
        let board = Board::bundled().unwrap();
        let dispatcher = dispatcher_for(&board, EffectTable::default());
        for (chance, expected) in [(f64::NAN, 0.0), (7.0, 1.0), (-0.5, 0.0), (0.25, 0.25)] {
            let rules = GameRules {
                optional_stop_chance: chance,
                ..rules(2)
            };
            assert!((rules.stop_probability() - expected).abs() < f64::EPSILON);
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            let result = run_game(&board, &dispatcher, &rules, &mut rng);
            assert!(result.rounds >= 1);
        }
    }

    #[test]
    fn single_tile_board_finishes_on_the_first_roll() {
        let board = plain_board(1);
        let dispatcher = dispatcher_for(&board, EffectTable::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = run_game(&board, &dispatcher, &rules(3), &mut rng);
        assert_eq!(result.rounds, 1);
        assert!(result.players.iter().all(|p| p.finished && p.position == 0));
    }

    #[test]
    fn positions_stay_on_the_board() {
        let board = Board::bundled().unwrap();
        let config = SimConfig::default();
        let rules = GameRules::from_config(&config, &board);
        let dispatcher = dispatcher_for(&board, EffectTable::default());
        let runner = GameRunner::new(&board, &dispatcher, &rules);
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..50 {
            let mut players = vec![PlayerState::new(); 4];
            for _ in 0..rules.max_rounds {
                for player in &mut players {
                    runner.take_turn(player, &mut rng);
                    assert!(player.position <= board.last_index());
                }
            }
        }
    }

    #[test]
    fn gyms_stop_movement_until_completed() {
        let board = Board::from_raw(vec![
            RawTile::named("start"),
            RawTile::named("a"),
            RawTile::default().with_header("Champion").with_background("gym"),
            RawTile::named("b"),
            RawTile::named("c"),
            RawTile::named("d"),
            RawTile::named("e"),
            RawTile::named("f"),
            RawTile::named("g"),
            RawTile::named("end"),
        ])
        .unwrap();
        let dispatcher = dispatcher_for(&board, EffectTable::default());
        let rules = rules(1);
        let runner = GameRunner::new(&board, &dispatcher, &rules);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let mut player = PlayerState::new();
        player.land_on(1, board.last_index());
        runner.take_turn(&mut player, &mut rng);
        assert_eq!(player.position, 2);
        assert_eq!(player.drinks, 10);
        assert!(player.flags.has_completed_gym(2));

        // Passing a completed gym no longer stops the player.
        let mut passed = 0;
        for _ in 0..50 {
            player.position = 1;
            runner.take_turn(&mut player, &mut rng);
            if player.position > 2 {
                passed += 1;
            }
        }
        assert!(passed > 0);

        let mut fresh = PlayerState::new();
        for _ in 0..50 {
            fresh.position = 1;
            fresh.flags = PlayerFlags::default();
            runner.take_turn(&mut fresh, &mut rng);
            assert_eq!(fresh.position, 2);
        }
    }

    #[test]
    fn lost_turns_are_spent_in_place() {
        let board = Board::from_raw(vec![
            RawTile::named("start"),
            RawTile::named("trap").with_text("Drink 2 at the start of turn"),
            RawTile::named("end"),
        ])
        .unwrap();
        let table = EffectTable::new(vec![(
            TileKey::Name("trap".to_string()),
            EffectRule::Drinks { drinks: 2 },
        )]);
        let dispatcher = dispatcher_for(&board, table);
        let rules = rules(1);
        let runner = GameRunner::new(&board, &dispatcher, &rules);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let mut player = PlayerState::new();
        player.land_on(1, board.last_index());
        player.add_lost_turns(2);
        runner.take_turn(&mut player, &mut rng);
        runner.take_turn(&mut player, &mut rng);
        assert_eq!(player.position, 1);
        assert_eq!(player.turns, 2);
        assert_eq!(player.drinks, 4);
        assert_eq!(player.phase(), TurnPhase::Active);
    }

    #[test]
    fn loop_zone_sends_high_rolls_back_to_its_entrance() {
        let board = Board::from_raw(vec![
            RawTile::named("start"),
            RawTile::named("forest gate").with_background("viridian_forest"),
            RawTile::named("forest 1").with_background("viridian_forest"),
            RawTile::named("forest 2").with_background("viridian_forest"),
            RawTile::named("forest 3").with_background("viridian_forest"),
            RawTile::named("forest 4").with_background("viridian_forest"),
            RawTile::named("forest 5").with_background("viridian_forest"),
            RawTile::named("forest 6").with_background("viridian_forest"),
            RawTile::named("forest 7").with_background("viridian_forest"),
            RawTile::named("forest 8").with_background("viridian_forest"),
            RawTile::named("exit"),
        ])
        .unwrap();
        let config = SimConfig {
            players: 1,
            ..SimConfig::default()
        };
        let rules = GameRules::from_config(&config, &board);
        assert_eq!(rules.loop_zones.len(), 1);
        let dispatcher = dispatcher_for(&board, EffectTable::default());
        let runner = GameRunner::new(&board, &dispatcher, &rules);

        let mut sent_back = 0;
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut player = PlayerState::new();
            runner.take_turn(&mut player, &mut rng);
            if player.drinks == 1 {
                assert_eq!(player.position, 1);
                sent_back += 1;
            } else {
                assert!(player.position <= 4);
            }
        }
        assert!(sent_back > 0);
    }

    #[test]
    fn every_game_terminates_within_the_cap() {
        let board = Board::bundled().unwrap();
        let config = SimConfig {
            max_rounds: 3,
            ..SimConfig::default()
        };
        let rules = GameRules::from_config(&config, &board);
        let dispatcher = dispatcher_for(&board, EffectTable::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let result = run_game(&board, &dispatcher, &rules, &mut rng);
        assert_eq!(result.rounds, 3);
        assert!(result.timed_out);
        assert_eq!(result.players.len(), 4);
    }
}
