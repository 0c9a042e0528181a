//! End-to-end generation scenarios
//!
//! Whole floors built through the public API:
//! - the seed 42 Easy reference floor
//! - the terminal floor (no exit, armed boss)
//! - reproducibility from a fixed seed
//! - door list consistency after room removal
//! - bonus clues without any regular chest
//! - configuration loading from JSON and RON files

use dungeon_core::carver::{destroy_room, CellKind};
use dungeon_core::config::{Difficulty, FloorParams, GenerationConfig, LadderDirection};
use dungeon_core::doors::DoorKind;
use dungeon_core::error::GenerationError;
use dungeon_core::level::{attempt_layout, generate_level, FloorDraft, Level};
use dungeon_core::population::items::{Item, ItemKind, Stat};
use dungeon_core::population::monsters::CreatureKind;
use dungeon_core::population::populate;
use dungeon_core::rng::FloorRng;
use dungeon_core::topology::PointKind;
use dungeon_core::visualization::render_cells;

fn build(difficulty: Difficulty, params: FloorParams, seed: u64) -> Level {
    let config = GenerationConfig::for_difficulty(difficulty);
    let mut rng = FloorRng::seeded(seed);
    generate_level(&config, params, &mut rng).expect("floor generates")
}

fn layout(difficulty: Difficulty, seed: u64) -> FloorDraft {
    let config = GenerationConfig::for_difficulty(difficulty);
    let mut rng = FloorRng::seeded(seed);
    (0..config.max_attempts)
        .find_map(|_| {
            attempt_layout(&config, FloorParams::first_floor(LadderDirection::Down), &mut rng).ok()
        })
        .expect("some attempt succeeds")
}

// ============================================================
// Reference floor
// ============================================================

#[test]
fn test_seed_42_easy_reference_floor() {
    let level = build(Difficulty::Easy, FloorParams::first_floor(LadderDirection::Down), 42);

    assert_eq!(level.points.size(), 4);
    assert_eq!(level.points.count(PointKind::RoomEntrance), 1);
    assert_eq!(level.points.count(PointKind::RoomExit), 1);
    assert_eq!(level.points.count(PointKind::RoomBoss), 1);
    assert_eq!(level.points.count(PointKind::RoomBonus), 1);

    let exit = level.points.find(PointKind::RoomExit).unwrap();
    let boss = level.points.find(PointKind::RoomBoss).unwrap();
    assert_eq!(boss.x, exit.x);
    assert_eq!(boss.y + 1, exit.y, "Boss must sit directly above a Down exit");

    let exit_doors = level
        .door_descriptors
        .iter()
        .filter(|d| d.kind == DoorKind::Exit)
        .count();
    assert_eq!(exit_doors, 1);

    let defects = level.verify();
    assert!(
        defects.is_empty(),
        "Defects: {:?}\n{}",
        defects,
        render_cells(&level.cells)
    );
}

#[test]
fn test_every_difficulty_verifies() {
    for difficulty in Difficulty::ALL {
        for seed in 0..4 {
            let level = build(difficulty, FloorParams::first_floor(LadderDirection::Right), seed);
            assert_eq!(level.points.size(), difficulty.points_per_axis());
            let defects = level.verify();
            assert!(defects.is_empty(), "{:?} seed {}: {:?}", difficulty, seed, defects);
        }
    }
}

#[test]
fn test_ladder_entrance_floor_verifies() {
    let first = build(Difficulty::Normal, FloorParams::first_floor(LadderDirection::Left), 3);
    let exit = first.points.find(PointKind::RoomExit).unwrap();
    let params = first.params.next_floor(exit, LadderDirection::Up);
    let second = build(Difficulty::Normal, params, 4);

    assert_eq!(second.params.depth, 2);
    let ladders = second.cells.iter().filter(|(_, k)| k.is_ladder()).count();
    assert_eq!(ladders, 2, "Entrance and exit each carry one ladder");
    assert_eq!(second.graphic_effects.len(), 2);
    assert!(second.verify().is_empty());
}

// ============================================================
// Terminal floor
// ============================================================

#[test]
fn test_terminal_floor_has_no_exit() {
    let mut params = FloorParams::first_floor(LadderDirection::NoLadder);
    params.depth = 5;
    let level = build(Difficulty::Normal, params, 11);

    assert_eq!(level.points.count(PointKind::RoomExit), 0);
    assert!(level.exit.is_none());
    assert!(level
        .door_descriptors
        .iter()
        .all(|d| d.kind != DoorKind::Exit));

    let boss = level
        .creatures
        .iter()
        .find(|c| c.kind == CreatureKind::Boss)
        .expect("terminal floor has a boss");
    let artifact = boss.equipment.artifact.as_ref().expect("boss is armed");
    assert_eq!(artifact.kind, ItemKind::SpecialArtifact);
    for stat in Stat::ALL {
        let expected = if stat == Stat::Speed { None } else { Some(20) };
        assert_eq!(artifact.effect_on(stat), expected, "{:?}", stat);
    }
    assert!(level.verify().is_empty());
}

// ============================================================
// Determinism
// ============================================================

#[test]
fn test_same_seed_same_floor() {
    let params = FloorParams::first_floor(LadderDirection::Down);
    let a = build(Difficulty::Hard, params.clone(), 1234);
    let b = build(Difficulty::Hard, params, 1234);
    assert_eq!(a.cells, b.cells);
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
}

#[test]
fn test_different_seeds_differ() {
    let params = FloorParams::first_floor(LadderDirection::Down);
    let a = build(Difficulty::Hard, params.clone(), 1);
    let b = build(Difficulty::Hard, params, 2);
    assert_ne!(a.cells, b.cells);
}

// ============================================================
// Door consistency after room removal
// ============================================================

#[test]
fn test_destroy_room_drops_its_doors() {
    let mut draft = (0..64)
        .map(|seed| layout(Difficulty::Hard, seed))
        .find(|d| d.doors.iter().any(|door| door.kind == DoorKind::Usual))
        .expect("some floor has a usual door");

    let door = *draft
        .doors
        .iter()
        .find(|d| d.kind == DoorKind::Usual)
        .unwrap();
    destroy_room(&mut draft, door.to);

    assert_eq!(draft.points.kind(door.to), PointKind::None);
    assert!(draft.doors.iter().all(|d| !d.references(door.to)));
    assert!(!draft.cells.kind(door.cell).is_door());
    assert_eq!(draft.edges.degree(door.to), 0);
}

// ============================================================
// Clues without chests
// ============================================================

#[test]
fn test_clues_go_to_creature_without_chests() {
    let mut draft = layout(Difficulty::Easy, 42);
    let chests: Vec<_> = draft
        .cells
        .iter()
        .filter(|(_, k)| *k == CellKind::FloorAndChest)
        .map(|(c, _)| c)
        .collect();
    for cell in chests {
        draft.cells.set(cell, CellKind::Floor);
    }
    draft.chest_count = 0;

    let mut rng = FloorRng::seeded(7);
    let pop = populate(&mut draft, &mut rng);
    assert!(pop.chests.iter().all(|c| c.bonus));

    let carriers: Vec<_> = pop
        .creatures
        .iter()
        .filter(|c| c.inventory.iter().any(|i| matches!(i, Item::Clue(_))))
        .collect();
    assert!(!carriers.is_empty());
    assert!(carriers.iter().all(|c| c.kind == CreatureKind::Monster));

    let clues: usize = carriers
        .iter()
        .map(|c| c.inventory.iter().filter(|i| matches!(i, Item::Clue(_))).count())
        .sum();
    assert_eq!(clues, 4);

    let code = draft.bonus_code.expect("bonus door placed");
    for (i, clue) in pop.clues.iter().enumerate() {
        assert_eq!(clue.and_then(|c| c.digit), Some(code[i]));
    }
}

#[test]
fn test_clue_carrier_synthesized_when_floor_is_empty() {
    let mut draft = layout(Difficulty::Easy, 9);
    let markers: Vec<_> = draft
        .cells
        .iter()
        .filter(|(_, k)| matches!(k, CellKind::FloorAndChest | CellKind::FloorAndMonster))
        .map(|(c, _)| c)
        .collect();
    for cell in markers {
        draft.cells.set(cell, CellKind::Floor);
    }
    // key holders lose their guardians too; only the clue path matters here
    draft.doors.retain(|d| d.kind == DoorKind::Bonus);
    draft.chest_count = 0;

    let mut rng = FloorRng::seeded(3);
    let pop = populate(&mut draft, &mut rng);
    let monsters: Vec<_> = pop
        .creatures
        .iter()
        .filter(|c| c.kind == CreatureKind::Monster)
        .collect();
    assert_eq!(monsters.len(), 1, "Exactly one carrier is synthesized");
    assert_eq!(
        monsters[0]
            .inventory
            .iter()
            .filter(|i| matches!(i, Item::Clue(_)))
            .count(),
        4
    );
    assert_eq!(draft.cells.kind(monsters[0].cell), CellKind::FloorAndMonster);
}

// ============================================================
// Configuration
// ============================================================

#[test]
fn test_config_from_json_and_ron_files() {
    let dir = tempfile::tempdir().unwrap();

    let json_path = dir.path().join("floor.json");
    std::fs::write(&json_path, r#"{ "difficulty": "Hard", "max_attempts": 50 }"#).unwrap();
    let config = GenerationConfig::from_file(&json_path).unwrap();
    assert_eq!(config.difficulty, Difficulty::Hard);
    assert_eq!(config.max_attempts, 50);
    assert_eq!(config.points_per_axis(), 6);

    let ron_path = dir.path().join("floor.ron");
    std::fs::write(
        &ron_path,
        "(difficulty: Easy, max_attempts: 20, points_per_axis_override: Some(3))",
    )
    .unwrap();
    let config = GenerationConfig::from_file(&ron_path).unwrap();
    assert_eq!(config.points_per_axis(), 3);

    let bad_path = dir.path().join("floor.toml");
    std::fs::write(&bad_path, "").unwrap();
    assert!(matches!(
        GenerationConfig::from_file(&bad_path),
        Err(GenerationError::InvalidConfig(_))
    ));
}

#[test]
fn test_zero_attempt_config_rejected() {
    let json = r#"{ "difficulty": "Easy", "max_attempts": 0 }"#;
    assert!(matches!(
        GenerationConfig::from_json(json),
        Err(GenerationError::InvalidConfig(_))
    ));
}
