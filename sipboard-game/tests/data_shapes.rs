use std::hash::Hasher;

use sipboard_game::{
    Board, EffectTable, GymCatalog, GymRule, JsonTileSource, SimConfig, TileCategory, TileSource,
    run_simulation,
};
use twox_hash::XxHash64;

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

fn report_digest(seed: u64) -> u64 {
    let config = SimConfig {
        games: 60,
        combat_samples: 300,
        tile_probe_samples: 50,
        seed,
        ..SimConfig::default()
    };
    let report = run_simulation(Board::bundled().expect("board"), config).expect("config");
    let canonical = serde_json::to_string_pretty(&report).expect("report serializes");
    snapshot_hash(canonical.as_bytes())
}

#[test]
fn bundled_board_shape() {
    let board = JsonTileSource::bundled().load_board().expect("bundled board");
    assert_eq!(board.len(), 70);
    assert_eq!(board.gyms().len(), 10);
    assert_eq!(board.optional_stops().len(), 4);
    assert_eq!(board.tile(0).map(|t| t.label()), Some("Pallet Town"));
    assert_eq!(
        board.tile(board.last_index()).map(|t| t.label()),
        Some("Hall of Fame")
    );
    assert!(!board.is_gym(board.last_index()));

    let zones = board.zone_counts();
    assert_eq!(zones[0], ("viridian_forest".to_string(), 6));
    assert_eq!(zones.len(), 6);
    assert!(
        board
            .tiles()
            .iter()
            .any(|t| matches!(&t.category, TileCategory::Zone(z) if z == "silph_co"))
    );
}

#[test]
fn every_bundled_gym_has_a_rule() {
    let board = Board::bundled().expect("board");
    let catalog = GymCatalog::default();
    for &gym in board.gyms() {
        let header = &board.tiles()[gym].header;
        assert_ne!(catalog.rule_for(header), &GymRule::Unknown, "{header}");
    }
}

#[test]
fn bundled_tiles_mostly_have_effects() {
    let board = Board::bundled().expect("board");
    let table = EffectTable::default();
    let bound = board
        .tiles()
        .iter()
        .filter(|t| !t.is_gym() && table.rule_for(t).is_some())
        .count();
    assert!(bound >= 40, "only {bound} tiles have effects");
}

#[test]
fn report_digest_is_stable_per_seed() {
    assert_eq!(report_digest(42), report_digest(42));
    assert_ne!(report_digest(42), report_digest(43));
}

#[test]
fn default_tables_serialize_stably() {
    let catalog = serde_json::to_string(&GymCatalog::default()).expect("catalog");
    let table = serde_json::to_string(&EffectTable::default()).expect("table");
    let again = serde_json::to_string(&GymCatalog::default()).expect("catalog");
    assert_eq!(snapshot_hash(catalog.as_bytes()), snapshot_hash(again.as_bytes()));
    let reparsed: EffectTable = serde_json::from_str(&table).expect("table parses");
    assert_eq!(reparsed, EffectTable::default());
}
