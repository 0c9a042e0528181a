//! Special-point placement and resolution of the remaining points.
//!
//! Each `place_*` pass tries candidate points in random order (the entrance
//! anchor first) until a room can be carved there. Running out of candidates
//! returns `false`, which the orchestrator turns into a full restart.

use tracing::trace;

use super::PointKind;
use crate::carver::{carve_room, destroy_room, RoomKind};
use crate::constants::{CORNER_CHANCE, ROOM_CHANCE};
use crate::grid::PointCoord;
use crate::level::FloorDraft;
use crate::rng::FloorRng;

fn shuffled_points(draft: &FloorDraft, rng: &mut FloorRng) -> Vec<PointCoord> {
    let mut points: Vec<PointCoord> = draft.geometry.points().collect();
    rng.shuffle(&mut points);
    points
}

/// Place the entrance room, honouring the anchor when it can host one
pub fn place_entrance(draft: &mut FloorDraft, rng: &mut FloorRng) -> bool {
    let n = draft.geometry.points_per_axis;
    let ladder = draft.params.entrance;
    let mut candidates = shuffled_points(draft, rng);
    if let Some(anchor) = draft.params.entrance_anchor {
        candidates.retain(|p| *p != anchor);
        candidates.insert(0, anchor);
    }

    let room = match (ladder.direction(), ladder.opening()) {
        (Some(marker), Some(open)) => RoomKind::Ladder { marker, open },
        _ => RoomKind::Entrance,
    };

    for p in candidates {
        if draft.points.kind(p) != PointKind::None {
            continue;
        }
        if let Some(open) = ladder.opening() {
            if p.step(open, n).is_none() {
                trace!(x = p.x, y = p.y, "entrance ladder would open off-grid");
                continue;
            }
        }
        if carve_room(draft, p, room, rng) {
            draft.points.set_kind(p, PointKind::RoomEntrance);
            return true;
        }
    }
    false
}

/// Place the exit ladder room with the boss room on its open side.
/// The terminal floor has no exit and gets a free-standing boss room.
pub fn place_exit_and_boss(draft: &mut FloorDraft, rng: &mut FloorRng) -> bool {
    let n = draft.geometry.points_per_axis;
    let forced = draft.entrance_forced_neighbor();
    let exit = draft.params.exit;
    let candidates = shuffled_points(draft, rng);

    let (Some(marker), Some(open)) = (exit.direction(), exit.opening()) else {
        for p in candidates {
            if draft.points.kind(p) == PointKind::None && carve_room(draft, p, RoomKind::Boss, rng) {
                draft.points.set_kind(p, PointKind::RoomBoss);
                return true;
            }
        }
        return false;
    };

    for exit_point in candidates {
        if draft.points.kind(exit_point) != PointKind::None || Some(exit_point) == forced {
            continue;
        }
        let Some(boss_point) = exit_point.step(open, n) else {
            continue;
        };
        if draft.points.kind(boss_point) != PointKind::None {
            continue;
        }
        if !carve_room(draft, exit_point, RoomKind::Ladder { marker, open }, rng) {
            continue;
        }
        if !carve_room(draft, boss_point, RoomKind::Boss, rng) {
            trace!(x = boss_point.x, y = boss_point.y, "boss room did not fit");
            destroy_room(draft, exit_point);
            continue;
        }
        draft.points.set_kind(exit_point, PointKind::RoomExit);
        draft.points.set_kind(boss_point, PointKind::RoomBoss);
        // locked in: the exit never takes another corridor
        draft.edges.insert(exit_point, boss_point);
        return true;
    }
    false
}

/// Place the bonus room anywhere but the entrance's forced neighbour
pub fn place_bonus(draft: &mut FloorDraft, rng: &mut FloorRng) -> bool {
    let forced = draft.entrance_forced_neighbor();
    for p in shuffled_points(draft, rng) {
        if draft.points.kind(p) != PointKind::None || Some(p) == forced {
            continue;
        }
        if carve_room(draft, p, RoomKind::Bonus, rng) {
            draft.points.set_kind(p, PointKind::RoomBonus);
            return true;
        }
    }
    false
}

/// Roll every still-empty point into a corner, an ordinary room or nothing
pub fn resolve_remaining_points(draft: &mut FloorDraft, rng: &mut FloorRng) {
    let points: Vec<PointCoord> = draft.geometry.points().collect();
    for p in points {
        if draft.points.kind(p) != PointKind::None {
            continue;
        }
        let roll = rng.roll();
        if roll < CORNER_CHANCE {
            draft.points.set_kind(p, PointKind::Corner);
        } else if roll < CORNER_CHANCE + ROOM_CHANCE && carve_room(draft, p, RoomKind::Usual, rng) {
            draft.points.set_kind(p, PointKind::RoomUsual);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, FloorParams, GenerationConfig, LadderDirection};

    fn draft(entrance: LadderDirection, exit: LadderDirection) -> FloorDraft {
        let config = GenerationConfig::for_difficulty(Difficulty::Easy);
        let mut params = FloorParams::first_floor(exit);
        params.entrance = entrance;
        FloorDraft::new(&config, params)
    }

    #[test]
    fn test_anchor_is_tried_first() {
        let mut d = draft(LadderDirection::NoLadder, LadderDirection::Down);
        d.params.entrance_anchor = Some(PointCoord::new(2, 1));
        let mut rng = FloorRng::seeded(5);
        assert!(place_entrance(&mut d, &mut rng));
        assert_eq!(d.points.find(PointKind::RoomEntrance), Some(PointCoord::new(2, 1)));
        assert!(d.points.room(PointCoord::new(2, 1)).is_some());
    }

    #[test]
    fn test_ladder_entrance_opens_inside_grid() {
        for seed in 0..20 {
            let mut d = draft(LadderDirection::Up, LadderDirection::Down);
            let mut rng = FloorRng::seeded(seed);
            assert!(place_entrance(&mut d, &mut rng));
            let entrance = d.points.find(PointKind::RoomEntrance).unwrap();
            assert!(
                entrance.step(crate::grid::Direction::Down, 4).is_some(),
                "Up ladder must open downward into the grid"
            );
        }
    }

    #[test]
    fn test_boss_sits_on_exit_open_side() {
        let mut d = draft(LadderDirection::NoLadder, LadderDirection::Down);
        let mut rng = FloorRng::seeded(42);
        assert!(place_entrance(&mut d, &mut rng));
        assert!(place_exit_and_boss(&mut d, &mut rng));
        let exit = d.points.find(PointKind::RoomExit).unwrap();
        let boss = d.points.find(PointKind::RoomBoss).unwrap();
        assert_eq!(exit.x, boss.x);
        assert_eq!(exit.y, boss.y + 1, "Boss must be directly above a Down exit");
        assert!(d.edges.contains(exit, boss));
    }

    #[test]
    fn test_terminal_floor_places_boss_only() {
        let mut d = draft(LadderDirection::NoLadder, LadderDirection::NoLadder);
        let mut rng = FloorRng::seeded(7);
        assert!(place_entrance(&mut d, &mut rng));
        assert!(place_exit_and_boss(&mut d, &mut rng));
        assert_eq!(d.points.count(PointKind::RoomExit), 0);
        assert_eq!(d.points.count(PointKind::RoomBoss), 1);
        assert!(d.edges.is_empty());
    }

    #[test]
    fn test_resolve_leaves_special_points() {
        let mut d = draft(LadderDirection::NoLadder, LadderDirection::Left);
        let mut rng = FloorRng::seeded(11);
        assert!(place_entrance(&mut d, &mut rng));
        assert!(place_exit_and_boss(&mut d, &mut rng));
        assert!(place_bonus(&mut d, &mut rng));
        resolve_remaining_points(&mut d, &mut rng);
        for kind in [
            PointKind::RoomEntrance,
            PointKind::RoomExit,
            PointKind::RoomBoss,
            PointKind::RoomBonus,
        ] {
            assert_eq!(d.points.count(kind), 1, "{:?} must stay unique", kind);
        }
        for (p, kind) in d.points.iter() {
            assert_eq!(kind.is_room(), d.points.room(p).is_some(), "{:?} at {:?}", kind, p);
        }
    }
}
