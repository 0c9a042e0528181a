//! Corridor construction between connection points.

use tracing::trace;

use super::PointKind;
use crate::carver::{carve_room, RoomKind};
use crate::constants::STOP_BRANCHING_CHANCE;
use crate::error::AttemptFailure;
use crate::grid::{Direction, PointCoord};
use crate::level::FloorDraft;
use crate::rng::FloorRng;

/// May a corridor run from `p` toward `dir` into `q`?
fn can_connect(draft: &FloorDraft, p: PointCoord, dir: Direction, q: PointCoord) -> bool {
    let from = draft.points.kind(p);
    let to = draft.points.kind(q);
    if from == PointKind::None || to == PointKind::None {
        return false;
    }
    if draft.edges.contains(p, q) {
        return false;
    }
    // the exit's only corridor is the one to its boss, inserted at placement
    if from == PointKind::RoomExit || to == PointKind::RoomExit {
        return false;
    }
    if let Some(open) = draft.params.entrance.opening() {
        if from == PointKind::RoomEntrance && dir != open {
            return false;
        }
        if to == PointKind::RoomEntrance && dir.opposite() != open {
            return false;
        }
    }
    if from == PointKind::RoomBonus && draft.edges.degree(p) > 0 {
        return false;
    }
    if to == PointKind::RoomBonus && draft.edges.degree(q) > 0 {
        return false;
    }
    true
}

/// Connect `p` to its legal neighbours, visiting up, down, left, right.
/// After the first new corridor each further one may be cut short by the
/// stop-branching roll. Returns the number of corridors added.
pub fn connect_point_to_points_around(
    draft: &mut FloorDraft,
    p: PointCoord,
    rng: &mut FloorRng,
) -> usize {
    let n = draft.geometry.points_per_axis;
    let mut added = 0;
    for dir in Direction::ALL {
        let Some(q) = p.step(dir, n) else {
            continue;
        };
        if !can_connect(draft, p, dir, q) {
            continue;
        }
        if added > 0 && rng.percent(STOP_BRANCHING_CHANCE) {
            break;
        }
        draft.edges.insert(p, q);
        added += 1;
    }
    added
}

/// Run the neighbour pass over every point in row-major order
pub fn connect_all_points(draft: &mut FloorDraft, rng: &mut FloorRng) {
    let points: Vec<PointCoord> = draft.geometry.points().collect();
    for p in points {
        if draft.points.kind(p) != PointKind::None {
            connect_point_to_points_around(draft, p, rng);
        }
    }
}

/// Every non-empty point needs a corridor, except the entrance of a one-point floor
pub fn check_isolated_points(draft: &FloorDraft) -> Result<(), AttemptFailure> {
    let single = draft.geometry.point_count() == 1;
    for (p, kind) in draft.points.iter() {
        if kind == PointKind::None || draft.edges.degree(p) > 0 {
            continue;
        }
        if single && kind == PointKind::RoomEntrance {
            continue;
        }
        return Err(AttemptFailure::IsolatedPoint { x: p.x, y: p.y });
    }
    Ok(())
}

/// Dead-end corners become ordinary rooms. Returns how many were converted.
pub fn repair_dead_corners(draft: &mut FloorDraft, rng: &mut FloorRng) -> usize {
    let mut repaired = 0;
    for p in draft.points.points_of(PointKind::Corner) {
        if draft.edges.degree(p) != 1 {
            continue;
        }
        if carve_room(draft, p, RoomKind::Usual, rng) {
            draft.points.set_kind(p, PointKind::RoomUsual);
            repaired += 1;
        } else {
            trace!(x = p.x, y = p.y, "dead corner could not be widened into a room");
        }
    }
    repaired
}
