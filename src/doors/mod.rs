//! Door & key distribution
//!
//! Runs once the cell grid is carved and shaded:
//! - the mandatory exit door between boss and exit, keyed to the boss
//! - the mandatory bonus door, locked by a four-digit code
//! - optional usual doors in front of dead-end and pass-through rooms, each
//!   keyed to a monster in a third room still reachable without crossing doors
//!
//! A usual door is refused when it would cut the door-free path from the
//! entrance to the boss, the bonus room's doorstep, or any key already handed out.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::carver::CellKind;
use crate::connectivity::{point_distances, point_reachable, ReachFilter};
use crate::constants::{BONUS_CODE_LEN, USUAL_DOOR_CHANCE};
use crate::grid::{CellCoord, PointCoord};
use crate::level::FloorDraft;
use crate::rng::FloorRng;
use crate::topology::PointKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorKind {
    Usual,
    Exit,
    Bonus,
}

/// Which way the door leaf runs; a corridor along x gets a vertical door
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorOrientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl KeyColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

const KEY_PALETTE: [KeyColor; 10] = [
    KeyColor::rgb(230, 57, 70),
    KeyColor::rgb(69, 123, 157),
    KeyColor::rgb(42, 157, 143),
    KeyColor::rgb(233, 196, 106),
    KeyColor::rgb(244, 162, 97),
    KeyColor::rgb(131, 56, 236),
    KeyColor::rgb(255, 0, 110),
    KeyColor::rgb(58, 134, 255),
    KeyColor::rgb(128, 237, 153),
    KeyColor::rgb(255, 255, 255),
];

/// Per-floor key colour source: the preset palette first, then random colours
#[derive(Debug, Clone, Default)]
pub struct KeyColorAllocator {
    issued: usize,
}

impl KeyColorAllocator {
    pub fn next_color(&mut self, rng: &mut FloorRng) -> KeyColor {
        let color = match KEY_PALETTE.get(self.issued) {
            Some(preset) => *preset,
            None => {
                let [r, g, b, _] = rng.next_u32().to_le_bytes();
                KeyColor::rgb(r, g, b)
            }
        };
        self.issued += 1;
        color
    }

    pub fn reset(&mut self) {
        self.issued = 0;
    }
}

/// How a door opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorLock {
    /// Key carried by the creature standing on `holder`
    Key { color: KeyColor, holder: CellCoord },
    /// Code spread over the floor's clue items
    Code { digits: [u8; BONUS_CODE_LEN] },
}

/// One locked door on a corridor between two points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorDescriptor {
    /// Point on the entrance side
    pub from: PointCoord,
    /// Point the door locks away
    pub to: PointCoord,
    /// Room holding the key; `None` for code-locked doors
    pub key_point: Option<PointCoord>,
    pub cell: CellCoord,
    pub kind: DoorKind,
    pub orientation: DoorOrientation,
    pub lock: DoorLock,
}

impl DoorDescriptor {
    pub fn references(&self, point: PointCoord) -> bool {
        self.from == point || self.to == point || self.key_point == Some(point)
    }

    pub fn cell_kind(&self) -> CellKind {
        match (self.kind, self.orientation) {
            (DoorKind::Usual, DoorOrientation::Vertical) => CellKind::FloorAndDoorVertical,
            (DoorKind::Usual, DoorOrientation::Horizontal) => CellKind::FloorAndDoorHorizontal,
            (DoorKind::Exit, DoorOrientation::Vertical) => CellKind::FloorAndDoorExitVertical,
            (DoorKind::Exit, DoorOrientation::Horizontal) => CellKind::FloorAndDoorExitHorizontal,
            (DoorKind::Bonus, DoorOrientation::Vertical) => CellKind::FloorAndDoorBonusVertical,
            (DoorKind::Bonus, DoorOrientation::Horizontal) => CellKind::FloorAndDoorBonusHorizontal,
        }
    }

    pub fn holder(&self) -> Option<CellCoord> {
        match self.lock {
            DoorLock::Key { holder, .. } => Some(holder),
            DoorLock::Code { .. } => None,
        }
    }
}

/// Doors placed by `distribute_doors`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorSummary {
    pub exit: usize,
    pub bonus: usize,
    pub usual: usize,
}

/// Border cell of `locked`'s room facing `upstream`, and the door orientation there
fn door_cell(
    draft: &FloorDraft,
    locked: PointCoord,
    upstream: PointCoord,
) -> Option<(CellCoord, DoorOrientation)> {
    let room = draft.points.room(locked)?;
    let dir = locked.direction_to(upstream)?;
    let (dx, dy) = dir.delta();
    let reach = (room.side / 2) as isize;
    let cell = room.center().offset(dx * reach, dy * reach, draft.cells.size())?;
    let orientation = if dir.is_horizontal() {
        DoorOrientation::Vertical
    } else {
        DoorOrientation::Horizontal
    };
    Some((cell, orientation))
}

fn install(draft: &mut FloorDraft, door: DoorDescriptor) {
    draft.cells.set(door.cell, door.cell_kind());
    draft.doors.push(door);
}

/// Exit door on the exit room's border, keyed to the boss
fn place_exit_door(draft: &mut FloorDraft, rng: &mut FloorRng) -> bool {
    let (Some(exit), Some(boss)) = (
        draft.points.find(PointKind::RoomExit),
        draft.points.find(PointKind::RoomBoss),
    ) else {
        return false;
    };
    let Some((cell, orientation)) = door_cell(draft, exit, boss) else {
        return false;
    };
    let holder = draft.geometry.point_center(boss);
    let color = draft.key_colors.next_color(rng);
    install(
        draft,
        DoorDescriptor {
            from: boss,
            to: exit,
            key_point: Some(boss),
            cell,
            kind: DoorKind::Exit,
            orientation,
            lock: DoorLock::Key { color, holder },
        },
    );
    true
}

/// Code-locked door between the bonus room and its only neighbour
fn place_bonus_door(draft: &mut FloorDraft, rng: &mut FloorRng) -> bool {
    let Some(bonus) = draft.points.find(PointKind::RoomBonus) else {
        return false;
    };
    let neighbors = draft.edges.neighbors(bonus);
    let &[upstream] = neighbors.as_slice() else {
        return false;
    };
    let Some((cell, orientation)) = door_cell(draft, bonus, upstream) else {
        return false;
    };
    let mut digits = [0u8; BONUS_CODE_LEN];
    for digit in digits.iter_mut() {
        *digit = rng.digit();
    }
    draft.bonus_code = Some(digits);
    install(
        draft,
        DoorDescriptor {
            from: upstream,
            to: bonus,
            key_point: None,
            cell,
            kind: DoorKind::Bonus,
            orientation,
            lock: DoorLock::Code { digits },
        },
    );
    true
}

/// Neighbour of `room` nearest the entrance once `room` itself is taken out.
/// Ties go to the first neighbour in coordinate order.
fn upstream_neighbor(
    draft: &FloorDraft,
    entrance: PointCoord,
    room: PointCoord,
) -> Option<PointCoord> {
    let dist = point_distances(&draft.edges, entrance, &ReachFilter::none().excluding(room));
    draft
        .edges
        .neighbors(room)
        .into_iter()
        .filter_map(|n| dist.get(&n).map(|d| (*d, n)))
        .min()
        .map(|(_, n)| n)
}

/// Points that must stay reachable from the entrance without crossing a door
fn must_stay_open(draft: &FloorDraft) -> Vec<PointCoord> {
    let mut targets: Vec<PointCoord> = draft.doors.iter().filter_map(|d| d.key_point).collect();
    targets.extend(draft.points.find(PointKind::RoomBoss));
    targets.extend(draft.doors_of(DoorKind::Bonus).map(|d| d.from));
    targets
}

/// First required point a door between `upstream` and `room` would lock away
fn cut_required_path(
    draft: &FloorDraft,
    entrance: PointCoord,
    upstream: PointCoord,
    room: PointCoord,
) -> Option<PointCoord> {
    let blocked = ReachFilter::none()
        .blocking_doors(&draft.doors)
        .blocking(upstream, room);
    must_stay_open(draft)
        .into_iter()
        .find(|t| !point_reachable(&draft.edges, entrance, *t, &blocked))
}

/// Existing monster in `room`, or a new one on a random non-centre floor cell
fn key_holder(
    draft: &mut FloorDraft,
    room_point: PointCoord,
    rng: &mut FloorRng,
) -> Option<CellCoord> {
    let room = draft.points.room(room_point)?;
    let monsters: Vec<CellCoord> = room
        .interior()
        .filter(|c| draft.cells.kind(*c) == CellKind::FloorAndMonster)
        .collect();
    if let Some(cell) = rng.pick(&monsters) {
        return Some(*cell);
    }
    let center = room.center();
    let floor: Vec<CellCoord> = room
        .interior()
        .filter(|c| *c != center && draft.cells.kind(*c) == CellKind::Floor)
        .collect();
    let cell = *rng.pick(&floor)?;
    draft.cells.set(cell, CellKind::FloorAndMonster);
    trace!(x = cell.x, y = cell.y, "synthesized key guardian");
    Some(cell)
}

/// Spiral through the row-major point order from a random start until an
/// ordinary room reachable without doors turns up
fn find_key_room(
    draft: &FloorDraft,
    entrance: PointCoord,
    from: PointCoord,
    to: PointCoord,
    rng: &mut FloorRng,
) -> Option<PointCoord> {
    let n = draft.geometry.points_per_axis;
    let count = n * n;
    let start = rng.index(count);
    let backwards = rng.percent(50.0);
    let filter = ReachFilter::none()
        .blocking_doors(&draft.doors)
        .blocking(from, to);
    (0..count)
        .map(|i| {
            let idx = if backwards {
                (start + count - i) % count
            } else {
                (start + i) % count
            };
            PointCoord::from_index(idx, n)
        })
        .find(|k| {
            draft.points.kind(*k) == PointKind::RoomUsual
                && *k != from
                && *k != to
                && point_reachable(&draft.edges, entrance, *k, &filter)
        })
}

/// Lock `room` off from `upstream` with a keyed door, or leave the corridor open
fn place_usual_door(
    draft: &mut FloorDraft,
    entrance: PointCoord,
    upstream: PointCoord,
    room: PointCoord,
    rng: &mut FloorRng,
) -> bool {
    if let Some(cut) = cut_required_path(draft, entrance, upstream, room) {
        trace!(
            x = room.x,
            y = room.y,
            cut_x = cut.x,
            cut_y = cut.y,
            "door would cut a required path"
        );
        return false;
    }

    let Some(key_room) = find_key_room(draft, entrance, upstream, room, rng) else {
        trace!(x = room.x, y = room.y, "no key room for door");
        return false;
    };
    let Some((cell, orientation)) = door_cell(draft, room, upstream) else {
        return false;
    };
    let Some(holder) = key_holder(draft, key_room, rng) else {
        return false;
    };
    let color = draft.key_colors.next_color(rng);
    install(
        draft,
        DoorDescriptor {
            from: upstream,
            to: room,
            key_point: Some(key_room),
            cell,
            kind: DoorKind::Usual,
            orientation,
            lock: DoorLock::Key { color, holder },
        },
    );
    true
}

fn try_usual_door(
    draft: &mut FloorDraft,
    entrance: PointCoord,
    room: PointCoord,
    rng: &mut FloorRng,
) -> bool {
    let degree = draft.edges.degree(room);
    if degree != 1 && degree != 2 {
        return false;
    }
    let Some(upstream) = upstream_neighbor(draft, entrance, room) else {
        return false;
    };
    if draft.doors.iter().any(|d| {
        (d.from == upstream && d.to == room) || (d.from == room && d.to == upstream)
    }) {
        return false;
    }
    if !rng.percent(USUAL_DOOR_CHANCE) {
        return false;
    }
    place_usual_door(draft, entrance, upstream, room, rng)
}

/// Place every door of the floor and assign its lock
pub fn distribute_doors(draft: &mut FloorDraft, rng: &mut FloorRng) -> DoorSummary {
    draft.key_colors.reset();
    let mut summary = DoorSummary::default();
    if place_exit_door(draft, rng) {
        summary.exit += 1;
    }
    if place_bonus_door(draft, rng) {
        summary.bonus += 1;
    }

    let Some(entrance) = draft.points.find(PointKind::RoomEntrance) else {
        return summary;
    };
    for room in draft.points.points_of(PointKind::RoomUsual) {
        if try_usual_door(draft, entrance, room, rng) {
            summary.usual += 1;
        }
    }
    debug!(
        exit = summary.exit,
        bonus = summary.bonus,
        usual = summary.usual,
        "doors distributed"
    );
    summary
}
