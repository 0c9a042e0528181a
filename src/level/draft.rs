//! Mutable state of one generation attempt.
//!
//! Every attempt starts from a fresh `FloorDraft`; nothing is patched across
//! retries.

use crate::carver::CellGrid;
use crate::config::{Difficulty, DifficultyScale, FloorParams, GenerationConfig};
use crate::constants::BONUS_CODE_LEN;
use crate::doors::{DoorDescriptor, DoorKind, KeyColorAllocator};
use crate::grid::{GridGeometry, PointCoord};
use crate::topology::{EdgeSet, PointGrid, PointKind};

#[derive(Debug, Clone)]
pub struct FloorDraft {
    pub params: FloorParams,
    pub difficulty: Difficulty,
    pub geometry: GridGeometry,
    pub scale: DifficultyScale,
    pub points: PointGrid,
    pub edges: EdgeSet,
    pub cells: CellGrid,
    pub doors: Vec<DoorDescriptor>,
    /// Regular chests stamped so far
    pub chest_count: usize,
    pub key_colors: KeyColorAllocator,
    pub bonus_code: Option<[u8; BONUS_CODE_LEN]>,
}

impl FloorDraft {
    pub fn new(config: &GenerationConfig, params: FloorParams) -> Self {
        let geometry = GridGeometry::new(config.points_per_axis());
        Self {
            params,
            difficulty: config.difficulty,
            geometry,
            scale: config.difficulty.scale(),
            points: PointGrid::new(geometry.points_per_axis),
            edges: EdgeSet::new(),
            cells: CellGrid::new(geometry.cells_per_axis()),
            doors: Vec::new(),
            chest_count: 0,
            key_colors: KeyColorAllocator::default(),
            bonus_code: None,
        }
    }

    pub fn entrance(&self) -> Option<PointCoord> {
        self.points.find(PointKind::RoomEntrance)
    }

    pub fn exit(&self) -> Option<PointCoord> {
        self.points.find(PointKind::RoomExit)
    }

    pub fn boss(&self) -> Option<PointCoord> {
        self.points.find(PointKind::RoomBoss)
    }

    pub fn bonus(&self) -> Option<PointCoord> {
        self.points.find(PointKind::RoomBonus)
    }

    /// The one neighbour a ladder entrance opens onto. `None` without a
    /// ladder or before the entrance is placed.
    pub fn entrance_forced_neighbor(&self) -> Option<PointCoord> {
        let open = self.params.entrance.opening()?;
        self.entrance()?
            .step(open, self.geometry.points_per_axis)
    }

    pub fn doors_of(&self, kind: DoorKind) -> impl Iterator<Item = &DoorDescriptor> {
        self.doors.iter().filter(move |d| d.kind == kind)
    }
}
