//! Room stamping, tunnels and room removal.

use tracing::trace;

use super::{CellGrid, CellKind};
use crate::connectivity::cell_reachable;
use crate::constants::{
    EXTRA_WALL_BLOCK_CHANCE, LADDER_ROOM_LEN, MIN_ROOM_LEN, MONSTER_SPAWN_MISS_CHANCE,
    MONSTER_SPAWN_TRIES, ROOM_CHEST_CHANCE,
};
use crate::doors::DoorDescriptor;
use crate::grid::{CellCoord, Direction, PointCoord};
use crate::level::FloorDraft;
use crate::rng::FloorRng;
use crate::topology::{PointKind, RoomFootprint};

/// What a carved room is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    Usual,
    Boss,
    Bonus,
    /// Plain entrance room of the first floor
    Entrance,
    /// 3×3 ladder room: `marker` at the centre, open toward `open`
    Ladder { marker: Direction, open: Direction },
}

/// Random odd interior side in `MIN_ROOM_LEN..=max`
fn roll_room_len(max: usize, rng: &mut FloorRng) -> usize {
    let choices = (max.saturating_sub(MIN_ROOM_LEN)) / 2 + 1;
    MIN_ROOM_LEN + 2 * rng.index(choices)
}

/// Stamp a room of `kind` centred on `point`. Fails without touching the grid
/// when the footprint leaves the grid or overlaps anything already carved.
pub fn carve_room(
    draft: &mut FloorDraft,
    point: PointCoord,
    kind: RoomKind,
    rng: &mut FloorRng,
) -> bool {
    let center = draft.geometry.point_center(point);
    let interior = match kind {
        RoomKind::Ladder { .. } => LADDER_ROOM_LEN,
        _ => roll_room_len(draft.geometry.max_room_len, rng),
    };
    let Some(room) = RoomFootprint::centered(center, interior) else {
        return false;
    };
    let fits = room
        .cells()
        .all(|c| draft.cells.contains(c) && draft.cells.kind(c) == CellKind::Nothing);
    if !fits {
        trace!(x = point.x, y = point.y, "room footprint overlaps carved cells");
        return false;
    }

    for cell in room.cells() {
        let base = if room.is_border(cell) {
            CellKind::Wall
        } else {
            CellKind::Floor
        };
        draft.cells.set(cell, base);
    }

    match kind {
        RoomKind::Ladder { marker, open } => {
            draft.cells.set(center, CellKind::ladder(marker));
            if let Some(opening) = center.step(open, draft.cells.size()) {
                draft.cells.set(opening, CellKind::Floor);
            }
        }
        _ => {
            add_obstructions(&mut draft.cells, &room, rng);
            let patch = if kind == RoomKind::Bonus { 2 } else { 1 };
            clear_center_patch(&mut draft.cells, center, patch);
            match kind {
                RoomKind::Usual => stock_usual_room(draft, center, rng),
                RoomKind::Boss => draft.cells.set(center, CellKind::FloorAndMonsterBoss),
                RoomKind::Bonus => lay_bonus_strip(&mut draft.cells, center, rng),
                _ => {}
            }
            demote_isolated_floor(&mut draft.cells, &room);
        }
    }

    draft.points.set_room(point, Some(room));
    true
}

/// Up to `2^(interior/2)` wall blocks, each mirrored into all four quadrants
fn add_obstructions(cells: &mut CellGrid, room: &RoomFootprint, rng: &mut FloorRng) {
    let len = room.interior_len();
    let half = len / 2;
    let inner = CellCoord::new(room.origin.x + 1, room.origin.y + 1);
    let blocks = rng.index((1usize << half) + 1);
    for _ in 0..blocks {
        let dx = rng.index(half);
        let dy = rng.index(half);
        for (x, y) in [
            (dx, dy),
            (len - 1 - dx, dy),
            (dx, len - 1 - dy),
            (len - 1 - dx, len - 1 - dy),
        ] {
            cells.set(CellCoord::new(inner.x + x, inner.y + y), CellKind::Wall);
        }
    }
}

fn clear_center_patch(cells: &mut CellGrid, center: CellCoord, radius: usize) {
    let r = radius as isize;
    for dy in -r..=r {
        for dx in -r..=r {
            if let Some(cell) = center.offset(dx, dy, cells.size()) {
                cells.set(cell, CellKind::Floor);
            }
        }
    }
}

/// Chest or pillar at the centre, then the monster-spawn rolls in the ring around it
fn stock_usual_room(draft: &mut FloorDraft, center: CellCoord, rng: &mut FloorRng) {
    let size = draft.cells.size();
    let chest_roll = rng.percent(draft.scale.apply(ROOM_CHEST_CHANCE));
    if chest_roll || draft.chest_count == 0 {
        draft.cells.set(center, CellKind::FloorAndChest);
        draft.chest_count += 1;
    } else if rng.percent(EXTRA_WALL_BLOCK_CHANCE) {
        let diagonals = [(-1, -1), (1, -1), (-1, 1), (1, 1)];
        if let Some(&(dx, dy)) = rng.pick(&diagonals) {
            if let Some(cell) = center.offset(dx, dy, size) {
                draft.cells.set(cell, CellKind::Wall);
            }
        }
    }

    let miss = draft.scale.apply(MONSTER_SPAWN_MISS_CHANCE);
    let ring: Vec<CellCoord> = center.neighbors8(size).take(MONSTER_SPAWN_TRIES).collect();
    for cell in ring {
        let spawn = !rng.percent(miss);
        if spawn && draft.cells.kind(cell) == CellKind::Floor {
            draft.cells.set(cell, CellKind::FloorAndMonster);
        }
    }
}

/// Three bonus chests through the centre, horizontal or vertical
fn lay_bonus_strip(cells: &mut CellGrid, center: CellCoord, rng: &mut FloorRng) {
    let (dx, dy) = if rng.percent(50.0) { (1, 0) } else { (0, 1) };
    for step in -1isize..=1 {
        if let Some(cell) = center.offset(dx * step, dy * step, cells.size()) {
            cells.set(cell, CellKind::FloorAndChestBonus);
        }
    }
}

/// Any walkable interior cell cut off from the centre turns back into wall
fn demote_isolated_floor(cells: &mut CellGrid, room: &RoomFootprint) {
    let center = room.center();
    let isolated: Vec<CellCoord> = room
        .interior()
        .filter(|c| cells.kind(*c).is_walkable() && !cell_reachable(cells, center, *c))
        .collect();
    for cell in isolated {
        cells.set(cell, CellKind::Wall);
    }
}

/// Straight corridor between two cells sharing exactly one axis. Empty and
/// wall cells become floor; anything floor-bearing is left alone.
pub fn carve_tunnel(cells: &mut CellGrid, a: CellCoord, b: CellCoord) -> bool {
    if (a.x == b.x) == (a.y == b.y) {
        return false;
    }
    if !cells.contains(a) || !cells.contains(b) {
        return false;
    }
    let path: Vec<CellCoord> = if a.x == b.x {
        (a.y.min(b.y)..=a.y.max(b.y)).map(|y| CellCoord::new(a.x, y)).collect()
    } else {
        (a.x.min(b.x)..=a.x.max(b.x)).map(|x| CellCoord::new(x, a.y)).collect()
    };
    for cell in path {
        let kind = cells.kind(cell);
        if kind == CellKind::Nothing || kind.is_wall() {
            cells.set(cell, CellKind::Floor);
        }
    }
    true
}

/// Remove a room (or corner) entirely: its cells, its corridors, and every
/// door that names it as an endpoint or key room.
pub fn destroy_room(draft: &mut FloorDraft, point: PointCoord) {
    if let Some(room) = draft.points.room(point) {
        let chests = room
            .cells()
            .filter(|c| draft.cells.kind(*c) == CellKind::FloorAndChest)
            .count();
        draft.chest_count = draft.chest_count.saturating_sub(chests);
        for cell in room.cells() {
            draft.cells.clear(cell);
        }
    }
    draft.points.set_room(point, None);
    draft.points.set_kind(point, PointKind::None);
    draft.edges.remove_point(point);

    let (orphaned, kept): (Vec<DoorDescriptor>, Vec<DoorDescriptor>) =
        std::mem::take(&mut draft.doors)
            .into_iter()
            .partition(|door| door.references(point));
    draft.doors = kept;
    for door in orphaned {
        if !draft.cells.kind(door.cell).is_door() {
            continue;
        }
        // an endpoint is gone so the corridor is sealed; a lost key room just unlocks
        let replacement = if door.from == point || door.to == point {
            CellKind::Wall
        } else {
            CellKind::Floor
        };
        draft.cells.set(door.cell, replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, FloorParams, GenerationConfig, LadderDirection};

    fn blank() -> FloorDraft {
        let config = GenerationConfig::for_difficulty(Difficulty::Normal);
        FloorDraft::new(&config, FloorParams::first_floor(LadderDirection::Down))
    }

    #[test]
    fn test_room_len_is_odd_and_bounded() {
        let mut rng = FloorRng::seeded(2);
        for _ in 0..200 {
            let len = roll_room_len(11, &mut rng);
            assert!(len % 2 == 1 && (MIN_ROOM_LEN..=11).contains(&len));
        }
        assert_eq!(roll_room_len(5, &mut rng), 5);
    }

    #[test]
    fn test_usual_room_shape() {
        for seed in 0..30 {
            let mut d = blank();
            let mut rng = FloorRng::seeded(seed);
            let p = PointCoord::new(1, 1);
            assert!(carve_room(&mut d, p, RoomKind::Usual, &mut rng));
            let room = d.points.room(p).unwrap();
            assert!(room
                .cells()
                .filter(|c| room.is_border(*c))
                .all(|c| d.cells.kind(c) == CellKind::Wall));
            assert_eq!(
                d.cells.kind(room.center()),
                CellKind::FloorAndChest,
                "First room on a floor always gets the chest"
            );
            for cell in room.interior() {
                if d.cells.kind(cell).is_walkable() {
                    assert!(cell_reachable(&d.cells, room.center(), cell), "Pocket at {:?}", cell);
                }
            }
        }
    }

    #[test]
    fn test_overlap_rejected() {
        let mut d = blank();
        let mut rng = FloorRng::seeded(1);
        let p = PointCoord::new(0, 0);
        assert!(carve_room(&mut d, p, RoomKind::Boss, &mut rng));
        let before = d.cells.clone();
        assert!(!carve_room(&mut d, p, RoomKind::Usual, &mut rng));
        assert_eq!(d.cells, before, "Rejected carve must not touch the grid");
    }

    #[test]
    fn test_ladder_room_opening() {
        let mut d = blank();
        let mut rng = FloorRng::seeded(8);
        let p = PointCoord::new(2, 2);
        let kind = RoomKind::Ladder {
            marker: Direction::Down,
            open: Direction::Up,
        };
        assert!(carve_room(&mut d, p, kind, &mut rng));
        let center = d.geometry.point_center(p);
        assert_eq!(d.cells.kind(center), CellKind::LadderDown);
        let above = center.step(Direction::Up, d.cells.size()).unwrap();
        assert_eq!(d.cells.kind(above), CellKind::Floor);
        let below = center.step(Direction::Down, d.cells.size()).unwrap();
        assert_eq!(d.cells.kind(below), CellKind::Wall);
        assert_eq!(d.points.room(p).unwrap().side, 3);
    }

    #[test]
    fn test_bonus_strip() {
        let mut d = blank();
        let mut rng = FloorRng::seeded(13);
        assert!(carve_room(&mut d, PointCoord::new(3, 0), RoomKind::Bonus, &mut rng));
        assert_eq!(d.cells.count(CellKind::FloorAndChestBonus), 3);
    }

    #[test]
    fn test_tunnel_needs_one_shared_axis() {
        let mut cells = CellGrid::new(10);
        assert!(!carve_tunnel(&mut cells, CellCoord::new(1, 1), CellCoord::new(3, 3)));
        assert!(!carve_tunnel(&mut cells, CellCoord::new(1, 1), CellCoord::new(1, 1)));
        cells.set(CellCoord::new(4, 2), CellKind::FloorAndMonster);
        cells.set(CellCoord::new(5, 2), CellKind::WallDark);
        assert!(carve_tunnel(&mut cells, CellCoord::new(7, 2), CellCoord::new(1, 2)));
        assert_eq!(cells.kind(CellCoord::new(4, 2)), CellKind::FloorAndMonster);
        assert_eq!(cells.kind(CellCoord::new(5, 2)), CellKind::Floor);
        assert_eq!(cells.count(CellKind::Floor), 6);
    }

    #[test]
    fn test_destroy_room_resets_cells_and_chests() {
        let mut d = blank();
        let mut rng = FloorRng::seeded(21);
        let p = PointCoord::new(1, 0);
        let q = PointCoord::new(2, 0);
        assert!(carve_room(&mut d, p, RoomKind::Usual, &mut rng));
        d.points.set_kind(p, PointKind::RoomUsual);
        d.edges.insert(p, q);
        assert_eq!(d.chest_count, 1);
        destroy_room(&mut d, p);
        assert_eq!(d.chest_count, 0);
        assert_eq!(d.points.kind(p), PointKind::None);
        assert!(d.edges.is_empty());
        assert_eq!(d.cells.count(CellKind::Nothing), d.cells.size() * d.cells.size());
    }
}
