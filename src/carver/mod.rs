//! Cell grid carving
//!
//! Turns the point topology into concrete typed cells:
//! - `rooms`: room stamping with obstructions and contents, tunnels, room removal
//! - `shading`: the four-pass wall halo around walkable space

pub mod rooms;
pub mod shading;

use serde::{Deserialize, Serialize};

use crate::grid::{CellCoord, Direction};

pub use rooms::{carve_room, carve_tunnel, destroy_room, RoomKind};
pub use shading::{shade_walls, ShadeReport};

/// Type of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Nothing,
    Floor,
    Wall,
    WallDark,
    WallDarkDark,
    FloorAndChest,
    FloorAndChestBonus,
    FloorAndDoorVertical,
    FloorAndDoorHorizontal,
    FloorAndDoorExitVertical,
    FloorAndDoorExitHorizontal,
    FloorAndDoorBonusVertical,
    FloorAndDoorBonusHorizontal,
    FloorAndMonster,
    FloorAndMonsterBoss,
    LadderUp,
    LadderDown,
    LadderLeft,
    LadderRight,
}

impl CellKind {
    pub fn is_wall(&self) -> bool {
        matches!(self, CellKind::Wall | CellKind::WallDark | CellKind::WallDarkDark)
    }

    /// Anything with floor underneath: plain floor, markers, doors, ladders
    pub fn is_floor_bearing(&self) -> bool {
        *self != CellKind::Nothing && !self.is_wall()
    }

    pub fn is_door(&self) -> bool {
        matches!(
            self,
            CellKind::FloorAndDoorVertical
                | CellKind::FloorAndDoorHorizontal
                | CellKind::FloorAndDoorExitVertical
                | CellKind::FloorAndDoorExitHorizontal
                | CellKind::FloorAndDoorBonusVertical
                | CellKind::FloorAndDoorBonusHorizontal
        )
    }

    /// Floor-bearing cells a reachability walk may cross; doors are closed
    pub fn is_walkable(&self) -> bool {
        self.is_floor_bearing() && !self.is_door()
    }

    pub fn is_ladder(&self) -> bool {
        self.ladder_direction().is_some()
    }

    pub fn ladder(dir: Direction) -> CellKind {
        match dir {
            Direction::Up => CellKind::LadderUp,
            Direction::Down => CellKind::LadderDown,
            Direction::Left => CellKind::LadderLeft,
            Direction::Right => CellKind::LadderRight,
        }
    }

    pub fn ladder_direction(&self) -> Option<Direction> {
        match self {
            CellKind::LadderUp => Some(Direction::Up),
            CellKind::LadderDown => Some(Direction::Down),
            CellKind::LadderLeft => Some(Direction::Left),
            CellKind::LadderRight => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Dense row-major grid of cells plus the shading pass that wrote each cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellGrid {
    size: usize,
    kinds: Vec<CellKind>,
    /// 0 when no shading pass wrote the cell, else 1..=4
    shade_pass: Vec<u8>,
}

impl CellGrid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            kinds: vec![CellKind::Nothing; size * size],
            shade_pass: vec![0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn index(&self, cell: CellCoord) -> usize {
        cell.y * self.size + cell.x
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x < self.size && cell.y < self.size
    }

    pub fn kind(&self, cell: CellCoord) -> CellKind {
        self.kinds[self.index(cell)]
    }

    pub fn set(&mut self, cell: CellCoord, kind: CellKind) {
        let idx = self.index(cell);
        self.kinds[idx] = kind;
    }

    pub fn shade_pass(&self, cell: CellCoord) -> u8 {
        self.shade_pass[self.index(cell)]
    }

    /// Revert a cell to empty and forget its shading
    pub fn clear(&mut self, cell: CellCoord) {
        let idx = self.index(cell);
        self.kinds[idx] = CellKind::Nothing;
        self.shade_pass[idx] = 0;
    }

    /// Row-major `(cell, kind)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellKind)> + '_ {
        let size = self.size;
        self.kinds
            .iter()
            .enumerate()
            .map(move |(i, kind)| (CellCoord::new(i % size, i / size), *kind))
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.kinds.iter().filter(|k| **k == kind).count()
    }
}
