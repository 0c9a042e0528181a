//! Connection-point topology
//!
//! The coarse N×N grid of connection points and the corridor graph between
//! them. Every reachability decision before cells exist is made here.
//!
//! - `placement` puts the entrance, exit, boss and bonus points down and rolls
//!   the rest into corners, rooms or nothing
//! - `edges` builds the corridor set and repairs dead-end corners

pub mod edges;
pub mod placement;

use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::grid::{CellCoord, PointCoord};

pub use edges::{check_isolated_points, connect_all_points, repair_dead_corners};
pub use placement::{place_bonus, place_entrance, place_exit_and_boss, resolve_remaining_points};

/// Role of one connection point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointKind {
    None,
    Corner,
    RoomUsual,
    RoomEntrance,
    RoomExit,
    RoomBoss,
    RoomBonus,
}

impl PointKind {
    pub fn is_room(&self) -> bool {
        !matches!(self, PointKind::None | PointKind::Corner)
    }

    /// Entrance, exit, boss or bonus
    pub fn is_special(&self) -> bool {
        self.is_room() && *self != PointKind::RoomUsual
    }
}

/// Square cell area owned by a carved room, wall border included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFootprint {
    /// Top-left wall cell
    pub origin: CellCoord,
    /// Odd side length including the border
    pub side: usize,
}

impl RoomFootprint {
    /// Footprint of a room with an odd `interior` side centred on `center`
    pub fn centered(center: CellCoord, interior: usize) -> Option<Self> {
        let half = interior / 2 + 1;
        Some(Self {
            origin: CellCoord::new(center.x.checked_sub(half)?, center.y.checked_sub(half)?),
            side: interior + 2,
        })
    }

    pub fn center(&self) -> CellCoord {
        CellCoord::new(self.origin.x + self.side / 2, self.origin.y + self.side / 2)
    }

    pub fn interior_len(&self) -> usize {
        self.side - 2
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        (self.origin.x..self.origin.x + self.side).contains(&cell.x)
            && (self.origin.y..self.origin.y + self.side).contains(&cell.y)
    }

    pub fn is_border(&self, cell: CellCoord) -> bool {
        self.contains(cell)
            && (cell.x == self.origin.x
                || cell.y == self.origin.y
                || cell.x == self.origin.x + self.side - 1
                || cell.y == self.origin.y + self.side - 1)
    }

    /// Every cell, row-major
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let RoomFootprint { origin, side } = *self;
        (0..side * side).map(move |i| CellCoord::new(origin.x + i % side, origin.y + i / side))
    }

    /// Interior cells, row-major
    pub fn interior(&self) -> impl Iterator<Item = CellCoord> {
        let footprint = *self;
        self.cells().filter(move |c| !footprint.is_border(*c))
    }
}

/// Kinds and carved rooms of every connection point
#[derive(Debug, Clone, Serialize)]
pub struct PointGrid {
    size: usize,
    kinds: Vec<PointKind>,
    rooms: Vec<Option<RoomFootprint>>,
}

impl PointGrid {
    pub fn new(points_per_axis: usize) -> Self {
        let count = points_per_axis * points_per_axis;
        Self {
            size: points_per_axis,
            kinds: vec![PointKind::None; count],
            rooms: vec![None; count],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn kind(&self, p: PointCoord) -> PointKind {
        self.kinds[p.index(self.size)]
    }

    pub fn set_kind(&mut self, p: PointCoord, kind: PointKind) {
        let idx = p.index(self.size);
        self.kinds[idx] = kind;
    }

    pub fn room(&self, p: PointCoord) -> Option<RoomFootprint> {
        self.rooms[p.index(self.size)]
    }

    pub fn set_room(&mut self, p: PointCoord, room: Option<RoomFootprint>) {
        let idx = p.index(self.size);
        self.rooms[idx] = room;
    }

    /// Row-major `(point, kind)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (PointCoord, PointKind)> + '_ {
        let size = self.size;
        self.kinds
            .iter()
            .enumerate()
            .map(move |(i, kind)| (PointCoord::from_index(i, size), *kind))
    }

    /// First point of `kind` in row-major order
    pub fn find(&self, kind: PointKind) -> Option<PointCoord> {
        self.iter().find(|(_, k)| *k == kind).map(|(p, _)| p)
    }

    pub fn points_of(&self, kind: PointKind) -> Vec<PointCoord> {
        self.iter().filter(|(_, k)| *k == kind).map(|(p, _)| p).collect()
    }

    pub fn count(&self, kind: PointKind) -> usize {
        self.kinds.iter().filter(|k| **k == kind).count()
    }

    /// Point whose carved room contains `cell`
    pub fn room_at(&self, cell: CellCoord) -> Option<PointCoord> {
        self.rooms
            .iter()
            .position(|room| room.is_some_and(|r| r.contains(cell)))
            .map(|i| PointCoord::from_index(i, self.size))
    }
}

/// Symmetric corridor set between connection points
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    graph: UnGraphMap<PointCoord, ()>,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a corridor; `false` if it already existed
    pub fn insert(&mut self, a: PointCoord, b: PointCoord) -> bool {
        self.graph.add_edge(a, b, ()).is_none()
    }

    pub fn contains(&self, a: PointCoord, b: PointCoord) -> bool {
        self.graph.contains_edge(a, b)
    }

    pub fn remove(&mut self, a: PointCoord, b: PointCoord) -> bool {
        self.graph.remove_edge(a, b).is_some()
    }

    /// Drop a point together with every corridor touching it
    pub fn remove_point(&mut self, p: PointCoord) {
        self.graph.remove_node(p);
    }

    pub fn degree(&self, p: PointCoord) -> usize {
        self.graph.neighbors(p).count()
    }

    /// Neighbours of `p`, sorted so iteration order never depends on insertion history
    pub fn neighbors(&self, p: PointCoord) -> Vec<PointCoord> {
        let mut out: Vec<PointCoord> = self.graph.neighbors(p).collect();
        out.sort();
        out
    }

    /// Sorted `(low, high)` pairs
    pub fn edges(&self) -> Vec<(PointCoord, PointCoord)> {
        let mut out: Vec<_> = self
            .graph
            .all_edges()
            .map(|(a, b, _)| if a <= b { (a, b) } else { (b, a) })
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

impl Serialize for EdgeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.edges().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_kind_roles() {
        assert!(!PointKind::Corner.is_room());
        assert!(PointKind::RoomUsual.is_room());
        assert!(!PointKind::RoomUsual.is_special());
        assert!(PointKind::RoomBonus.is_special());
    }

    #[test]
    fn test_footprint_geometry() {
        let room = RoomFootprint::centered(CellCoord::new(6, 6), 7).unwrap();
        assert_eq!(room.origin, CellCoord::new(2, 2));
        assert_eq!(room.side, 9);
        assert_eq!(room.center(), CellCoord::new(6, 6));
        assert_eq!(room.cells().count(), 81);
        assert_eq!(room.interior().count(), 49);
        assert!(room.is_border(CellCoord::new(10, 6)));
        assert!(!room.contains(CellCoord::new(11, 6)));
        assert!(RoomFootprint::centered(CellCoord::new(1, 1), 5).is_none());
    }

    #[test]
    fn test_edge_set_symmetric() {
        let a = PointCoord::new(0, 0);
        let b = PointCoord::new(1, 0);
        let mut edges = EdgeSet::new();
        assert!(edges.insert(a, b));
        assert!(!edges.insert(b, a), "Reverse insert is a duplicate");
        assert!(edges.contains(b, a));
        assert_eq!(edges.degree(a), 1);
        assert_eq!(edges.edges(), vec![(a, b)]);
        edges.remove_point(b);
        assert!(edges.is_empty());
        assert_eq!(edges.degree(a), 0);
    }

    #[test]
    fn test_point_grid_queries() {
        let mut grid = PointGrid::new(3);
        grid.set_kind(PointCoord::new(2, 1), PointKind::RoomBoss);
        grid.set_kind(PointCoord::new(0, 2), PointKind::Corner);
        grid.set_kind(PointCoord::new(1, 2), PointKind::Corner);
        assert_eq!(grid.find(PointKind::RoomBoss), Some(PointCoord::new(2, 1)));
        assert_eq!(grid.count(PointKind::Corner), 2);
        assert_eq!(grid.count(PointKind::None), 6);
        assert_eq!(grid.find(PointKind::RoomExit), None);
    }
}
