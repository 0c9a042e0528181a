//! Grid primitives: connection points, cells, world pixels.
//!
//! Three coordinate spaces share one origin (top-left, y grows downward):
//! - `PointCoord`: coarse N×N connection-point grid
//! - `CellCoord`: fine cell grid, `tunnel_length` cells per point on each axis
//! - `WorldPos`: pixels, `CELL_SIZE_PX` per cell
//!
//! Everything here is pure math over values.

use serde::{Deserialize, Serialize};

use crate::constants::{CELL_SIZE_PX, MIN_ROOM_LEN, ROOM_MARGIN};

/// Cardinal direction on either grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed neighbour visiting order
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn delta(&self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

fn offset(x: usize, y: usize, dx: isize, dy: isize, size: usize) -> Option<(usize, usize)> {
    let nx = x.checked_add_signed(dx)?;
    let ny = y.checked_add_signed(dy)?;
    (nx < size && ny < size).then_some((nx, ny))
}

/// Position on the connection-point grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointCoord {
    pub x: usize,
    pub y: usize,
}

impl PointCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn from_index(index: usize, points_per_axis: usize) -> Self {
        Self::new(index % points_per_axis, index / points_per_axis)
    }

    pub fn index(&self, points_per_axis: usize) -> usize {
        self.y * points_per_axis + self.x
    }

    /// Neighbouring point, `None` past the grid edge
    pub fn step(&self, dir: Direction, points_per_axis: usize) -> Option<PointCoord> {
        let (dx, dy) = dir.delta();
        offset(self.x, self.y, dx, dy, points_per_axis).map(|(x, y)| PointCoord::new(x, y))
    }

    /// Direction from `self` to an orthogonally adjacent point
    pub fn direction_to(&self, other: PointCoord) -> Option<Direction> {
        Direction::ALL.into_iter().find(|dir| {
            let (dx, dy) = dir.delta();
            self.x.checked_add_signed(dx) == Some(other.x)
                && self.y.checked_add_signed(dy) == Some(other.y)
        })
    }
}

/// Position on the cell grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: usize,
    pub y: usize,
}

impl CellCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: isize, dy: isize, size: usize) -> Option<CellCoord> {
        offset(self.x, self.y, dx, dy, size).map(|(x, y)| CellCoord::new(x, y))
    }

    pub fn step(&self, dir: Direction, size: usize) -> Option<CellCoord> {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy, size)
    }

    /// Orthogonal neighbours inside a `size`×`size` grid
    pub fn neighbors4(self, size: usize) -> impl Iterator<Item = CellCoord> {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| self.step(dir, size))
    }

    /// All eight surrounding cells inside a `size`×`size` grid
    pub fn neighbors8(self, size: usize) -> impl Iterator<Item = CellCoord> {
        (-1isize..=1)
            .flat_map(|dy| (-1isize..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .filter_map(move |(dx, dy)| self.offset(dx, dy, size))
    }
}

/// World-space pixel position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Sizes derived from the number of points per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub points_per_axis: usize,
    /// Largest odd interior side a room may have
    pub max_room_len: usize,
    /// Cells between the centres of adjacent points
    pub tunnel_length: usize,
}

impl GridGeometry {
    pub fn new(points_per_axis: usize) -> Self {
        let mut max_room_len = (points_per_axis * 3 / 2).max(MIN_ROOM_LEN);
        if max_room_len % 2 == 0 {
            max_room_len += 1;
        }
        // interior + wall border on both sides + margin on both sides
        let tunnel_length = max_room_len + 2 + 2 * ROOM_MARGIN;
        Self {
            points_per_axis,
            max_room_len,
            tunnel_length,
        }
    }

    /// Side of the square cell grid
    pub fn cells_per_axis(&self) -> usize {
        self.tunnel_length * self.points_per_axis
    }

    pub fn point_count(&self) -> usize {
        self.points_per_axis * self.points_per_axis
    }

    /// Row-major iteration over every point
    pub fn points(&self) -> impl Iterator<Item = PointCoord> {
        let n = self.points_per_axis;
        (0..n * n).map(move |i| PointCoord::from_index(i, n))
    }

    pub fn contains_point(&self, p: PointCoord) -> bool {
        p.x < self.points_per_axis && p.y < self.points_per_axis
    }

    /// Centre cell of a point's block
    pub fn point_center(&self, p: PointCoord) -> CellCoord {
        let half = self.tunnel_length / 2;
        CellCoord::new(
            p.x * self.tunnel_length + half,
            p.y * self.tunnel_length + half,
        )
    }

    /// Point whose block contains `cell`
    pub fn cell_to_point(&self, cell: CellCoord) -> PointCoord {
        PointCoord::new(cell.x / self.tunnel_length, cell.y / self.tunnel_length)
    }

    pub fn contains_cell(&self, cell: CellCoord) -> bool {
        let size = self.cells_per_axis();
        cell.x < size && cell.y < size
    }

    /// Cell under a world position, `None` outside the grid
    pub fn world_to_cell(&self, pos: WorldPos) -> Option<CellCoord> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let cell = CellCoord::new(
            (pos.x / CELL_SIZE_PX) as usize,
            (pos.y / CELL_SIZE_PX) as usize,
        );
        self.contains_cell(cell).then_some(cell)
    }
}

/// Top-left pixel of a cell
pub fn cell_to_world(cell: CellCoord) -> WorldPos {
    WorldPos::new(cell.x as f32 * CELL_SIZE_PX, cell.y as f32 * CELL_SIZE_PX)
}

/// Centre pixel of a cell
pub fn cell_center_world(cell: CellCoord) -> WorldPos {
    let corner = cell_to_world(cell);
    WorldPos::new(corner.x + CELL_SIZE_PX / 2.0, corner.y + CELL_SIZE_PX / 2.0)
}
