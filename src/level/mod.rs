//! Level orchestration and the finished floor
//!
//! - `draft`: per-attempt mutable state
//! - `orchestrator`: the stage sequence, global retry loop and input checks
//!
//! A `Level` is what downstream systems consume. Its topology is frozen once
//! built; only entity membership, creature stats and the discovered mask change
//! afterwards.

pub mod draft;
pub mod orchestrator;

use serde::Serialize;
use thiserror::Error;

use crate::carver::{CellGrid, CellKind};
use crate::config::{Difficulty, FloorParams};
use crate::connectivity::{point_reachable, ReachFilter};
use crate::constants::BONUS_CODE_LEN;
use crate::doors::{DoorDescriptor, DoorKind, DoorLock};
use crate::grid::{cell_center_world, CellCoord, GridGeometry, PointCoord, WorldPos};
use crate::population::items::{ClueItem, Item, ItemKind, PowerBudget, StatEffect};
use crate::population::monsters::CreatureKind;
use crate::population::{
    build_creature, Block, Chest, Creature, DoorEntity, EntityId, GraphicEffect, Population,
};
use crate::rng::FloorRng;
use crate::topology::{EdgeSet, PointGrid, PointKind};

pub use draft::FloorDraft;
pub use orchestrator::{attempt_generate, attempt_layout, generate_level, GenerationStage};

/// Any entity a level can hold, routed into its collection by tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Entity {
    Creature(Creature),
    Chest(Chest),
    Door(DoorEntity),
    Block(Block),
    GraphicEffect(GraphicEffect),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Creature(c) => c.id,
            Entity::Chest(c) => c.id,
            Entity::Door(d) => d.id,
            Entity::Block(b) => b.id,
            Entity::GraphicEffect(g) => g.id,
        }
    }

    fn set_id(&mut self, id: EntityId) {
        match self {
            Entity::Creature(c) => c.id = id,
            Entity::Chest(c) => c.id = id,
            Entity::Door(d) => d.id = id,
            Entity::Block(b) => b.id = id,
            Entity::GraphicEffect(g) => g.id = id,
        }
    }
}

/// What the minimap draws for one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MinimapTile {
    Hidden,
    Empty,
    Wall,
    Floor,
    Door,
    Chest,
    Monster,
    Ladder,
}

/// A broken floor invariant found by `Level::verify`
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum LevelDefect {
    #[error("point ({x}, {y}) is not reachable from the entrance")]
    UnreachablePoint { x: usize, y: usize },
    #[error("expected exactly one entrance, found {0}")]
    EntranceCount(usize),
    #[error("terminal floor has an exit room")]
    UnexpectedExit,
    #[error("boss room does not sit on the exit's open side")]
    BossNotBesideExit,
    #[error("expected exactly one exit door between boss and exit, found {0}")]
    ExitDoorCount(usize),
    #[error("terminal boss lacks the special artifact")]
    MissingSpecialArtifact,
    #[error("key room for door at ({x}, {y}) is behind a door")]
    KeyRoomBehindDoor { x: usize, y: usize },
    #[error("key room for door at ({x}, {y}) is not an ordinary third room")]
    KeyRoomNotUsual { x: usize, y: usize },
    #[error("key holder for door at ({x}, {y}) stands outside the key room")]
    KeyHolderOutsideRoom { x: usize, y: usize },
    #[error("nobody carries the key for door at ({x}, {y})")]
    KeyNotCarried { x: usize, y: usize },
    #[error("expected exactly one bonus room, found {0}")]
    BonusRoomCount(usize),
    #[error("bonus room has {0} corridors")]
    BonusEdgeCount(usize),
    #[error("expected exactly one bonus door on the bonus corridor, found {0}")]
    BonusDoorCount(usize),
    #[error("clue {index} does not carry bonus code digit")]
    ClueMismatch { index: usize },
    #[error("{0} clue items were handed out")]
    CluesHandedOut(usize),
    #[error("shaded cell ({x}, {y}) is not a wall")]
    ShadedNonWall { x: usize, y: usize },
    #[error("door at ({x}, {y}) references a destroyed point")]
    OrphanedDoor { x: usize, y: usize },
    #[error("door at ({x}, {y}) has no matching door cell")]
    DoorCellMismatch { x: usize, y: usize },
}

/// A fully generated, populated floor
#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub params: FloorParams,
    pub difficulty: Difficulty,
    pub geometry: GridGeometry,
    pub points: PointGrid,
    pub edges: EdgeSet,
    pub cells: CellGrid,
    pub door_descriptors: Vec<DoorDescriptor>,
    pub creatures: Vec<Creature>,
    pub chests: Vec<Chest>,
    pub doors: Vec<DoorEntity>,
    pub blocks: Vec<Block>,
    pub graphic_effects: Vec<GraphicEffect>,
    pub entrance: WorldPos,
    pub exit: Option<WorldPos>,
    pub bonus_code: Option<[u8; BONUS_CODE_LEN]>,
    pub clues: [Option<ClueItem>; BONUS_CODE_LEN],
    /// Attempts the retry loop needed, including the successful one
    pub attempts: u32,
    discovered: Vec<u64>,
    spawn_sites: Vec<CellCoord>,
    next_id: u64,
}

impl Level {
    /// Freeze a finished draft and its population into a level
    pub fn assemble(draft: FloorDraft, population: Population, attempts: u32) -> Self {
        let point_world =
            |p: PointCoord| cell_center_world(draft.geometry.point_center(p));
        let entrance = draft
            .entrance()
            .map(point_world)
            .unwrap_or_default();
        let exit = draft.exit().map(point_world);
        let cell_count = draft.cells.size() * draft.cells.size();

        Self {
            entrance,
            exit,
            params: draft.params,
            difficulty: draft.difficulty,
            geometry: draft.geometry,
            points: draft.points,
            edges: draft.edges,
            cells: draft.cells,
            door_descriptors: draft.doors,
            bonus_code: draft.bonus_code,
            creatures: population.creatures,
            chests: population.chests,
            doors: population.doors,
            blocks: population.blocks,
            graphic_effects: population.graphic_effects,
            clues: population.clues,
            spawn_sites: population.spawn_sites,
            next_id: population.next_id,
            discovered: vec![0; cell_count.div_ceil(64)],
            attempts,
        }
    }

    pub fn cell_kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.cells.contains(cell).then(|| self.cells.kind(cell))
    }

    pub fn point_kind(&self, p: PointCoord) -> PointKind {
        self.points.kind(p)
    }

    pub fn is_terminal(&self) -> bool {
        self.params.is_terminal()
    }

    fn bit(&self, cell: CellCoord) -> Option<(usize, u64)> {
        if !self.cells.contains(cell) {
            return None;
        }
        let idx = self.cells.index(cell);
        Some((idx / 64, 1 << (idx % 64)))
    }

    pub fn is_discovered(&self, cell: CellCoord) -> bool {
        self.bit(cell)
            .is_some_and(|(word, mask)| self.discovered[word] & mask != 0)
    }

    pub fn set_discovered(&mut self, cell: CellCoord, discovered: bool) {
        let Some((word, mask)) = self.bit(cell) else {
            return;
        };
        if discovered {
            self.discovered[word] |= mask;
        } else {
            self.discovered[word] &= !mask;
        }
    }

    /// Minimap tile for a cell; undiscovered cells stay hidden
    pub fn minimap_tile(&self, cell: CellCoord) -> MinimapTile {
        if !self.is_discovered(cell) {
            return MinimapTile::Hidden;
        }
        match self.cells.kind(cell) {
            CellKind::Nothing => MinimapTile::Empty,
            k if k.is_wall() => MinimapTile::Wall,
            k if k.is_door() => MinimapTile::Door,
            k if k.is_ladder() => MinimapTile::Ladder,
            CellKind::FloorAndChest | CellKind::FloorAndChestBonus => MinimapTile::Chest,
            CellKind::FloorAndMonster | CellKind::FloorAndMonsterBoss => MinimapTile::Monster,
            _ => MinimapTile::Floor,
        }
    }

    /// Monster marker cells left by generation, for the spawn scheduler
    pub fn spawn_sites(&self) -> &[CellCoord] {
        &self.spawn_sites
    }

    /// Place a freshly equipped monster on `cell`. `None` if nothing can
    /// stand there.
    pub fn spawn_creature(&mut self, cell: CellCoord, rng: &mut FloorRng) -> Option<EntityId> {
        if !self.cell_kind(cell)?.is_walkable() {
            return None;
        }
        let budget = PowerBudget::for_floor(self.params.depth, self.difficulty);
        let creature = build_creature(
            EntityId(0),
            CreatureKind::Monster,
            cell,
            self.params.depth,
            &budget,
            self.difficulty.scale(),
            rng,
        );
        Some(self.add_entity(Entity::Creature(creature)))
    }

    /// Route an entity into its collection under a fresh id
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.set_id(id);
        match entity {
            Entity::Creature(c) => self.creatures.push(c),
            Entity::Chest(c) => self.chests.push(c),
            Entity::Door(d) => self.doors.push(d),
            Entity::Block(b) => self.blocks.push(b),
            Entity::GraphicEffect(g) => self.graphic_effects.push(g),
        }
        id
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        fn take<T>(list: &mut Vec<T>, id: EntityId, id_of: impl Fn(&T) -> EntityId) -> Option<T> {
            let pos = list.iter().position(|e| id_of(e) == id)?;
            Some(list.remove(pos))
        }
        take(&mut self.creatures, id, |c| c.id)
            .map(Entity::Creature)
            .or_else(|| take(&mut self.chests, id, |c| c.id).map(Entity::Chest))
            .or_else(|| take(&mut self.doors, id, |d| d.id).map(Entity::Door))
            .or_else(|| take(&mut self.blocks, id, |b| b.id).map(Entity::Block))
            .or_else(|| take(&mut self.graphic_effects, id, |g| g.id).map(Entity::GraphicEffect))
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id == id)
    }

    /// Apply a stat effect to a creature.
    ///
    /// # Panics
    ///
    /// Panics when no creature owns `creature_id`: activating an effect
    /// without an owner is a caller bug, not a recoverable state.
    pub fn activate_effect(&mut self, creature_id: EntityId, effect: StatEffect) {
        let creature = self
            .creatures
            .iter_mut()
            .find(|c| c.id == creature_id)
            .unwrap_or_else(|| {
                panic!("effect {:?} activated without owning creature {:?}", effect, creature_id)
            });
        creature.stats.apply(effect);
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check every structural invariant of a finished floor
    pub fn verify(&self) -> Vec<LevelDefect> {
        let mut defects = Vec::new();
        let entrances = self.points.points_of(PointKind::RoomEntrance);
        let [entrance] = entrances.as_slice() else {
            defects.push(LevelDefect::EntranceCount(entrances.len()));
            return defects;
        };
        let entrance = *entrance;

        self.verify_reachability(entrance, &mut defects);
        self.verify_exit(&mut defects);
        self.verify_keys(entrance, &mut defects);
        self.verify_bonus(&mut defects);
        self.verify_cells(&mut defects);
        defects
    }

    fn verify_reachability(&self, entrance: PointCoord, defects: &mut Vec<LevelDefect>) {
        let open = ReachFilter::none();
        for (p, kind) in self.points.iter() {
            let must_reach = matches!(
                kind,
                PointKind::RoomUsual | PointKind::RoomBoss | PointKind::RoomBonus | PointKind::RoomExit
            );
            if must_reach && !point_reachable(&self.edges, entrance, p, &open) {
                defects.push(LevelDefect::UnreachablePoint { x: p.x, y: p.y });
            }
        }
    }

    fn verify_exit(&self, defects: &mut Vec<LevelDefect>) {
        let exit = self.points.find(PointKind::RoomExit);
        let boss = self.points.find(PointKind::RoomBoss);
        let exit_doors: Vec<&DoorDescriptor> = self
            .door_descriptors
            .iter()
            .filter(|d| d.kind == DoorKind::Exit)
            .collect();

        if self.is_terminal() {
            if exit.is_some() {
                defects.push(LevelDefect::UnexpectedExit);
            }
            if !exit_doors.is_empty() {
                defects.push(LevelDefect::ExitDoorCount(exit_doors.len()));
            }
            let armed = self.creatures.iter().any(|c| {
                c.kind == CreatureKind::Boss
                    && c.equipment
                        .artifact
                        .as_ref()
                        .is_some_and(|a| a.kind == ItemKind::SpecialArtifact)
            });
            if !armed {
                defects.push(LevelDefect::MissingSpecialArtifact);
            }
            return;
        }

        let (Some(exit), Some(boss)) = (exit, boss) else {
            defects.push(LevelDefect::BossNotBesideExit);
            return;
        };
        let beside = self
            .params
            .exit
            .opening()
            .and_then(|open| exit.step(open, self.geometry.points_per_axis))
            == Some(boss);
        if !beside || !self.edges.contains(exit, boss) {
            defects.push(LevelDefect::BossNotBesideExit);
        }
        let on_edge = exit_doors
            .iter()
            .filter(|d| (d.from == boss && d.to == exit) || (d.from == exit && d.to == boss))
            .count();
        if on_edge != 1 || exit_doors.len() != 1 {
            defects.push(LevelDefect::ExitDoorCount(exit_doors.len()));
        }
    }

    fn verify_keys(&self, entrance: PointCoord, defects: &mut Vec<LevelDefect>) {
        let closed = ReachFilter::none().blocking_doors(&self.door_descriptors);
        for door in &self.door_descriptors {
            let DoorLock::Key { holder, .. } = door.lock else {
                continue;
            };
            let cell = door.cell;
            let key_reachable = door
                .key_point
                .is_some_and(|k| point_reachable(&self.edges, entrance, k, &closed));
            if !key_reachable {
                defects.push(LevelDefect::KeyRoomBehindDoor { x: cell.x, y: cell.y });
            }
            // exit keys sit with the boss on the door's own side
            let third_room = door.key_point.is_some_and(|k| {
                self.points.kind(k) == PointKind::RoomUsual && k != door.from && k != door.to
            });
            if door.kind == DoorKind::Usual && !third_room {
                defects.push(LevelDefect::KeyRoomNotUsual { x: cell.x, y: cell.y });
            }
            if door.key_point.is_none() || self.points.room_at(holder) != door.key_point {
                defects.push(LevelDefect::KeyHolderOutsideRoom { x: cell.x, y: cell.y });
            }
            let carried = self.creatures.iter().any(|c| {
                c.cell == holder
                    && c.inventory
                        .iter()
                        .any(|item| matches!(item, Item::Key(k) if k.door_cell == cell))
            });
            if !carried {
                defects.push(LevelDefect::KeyNotCarried { x: cell.x, y: cell.y });
            }
        }
    }

    fn verify_bonus(&self, defects: &mut Vec<LevelDefect>) {
        let bonus_rooms = self.points.points_of(PointKind::RoomBonus);
        let [bonus] = bonus_rooms.as_slice() else {
            defects.push(LevelDefect::BonusRoomCount(bonus_rooms.len()));
            return;
        };
        let degree = self.edges.degree(*bonus);
        if degree != 1 {
            defects.push(LevelDefect::BonusEdgeCount(degree));
        }

        let bonus_doors: Vec<&DoorDescriptor> = self
            .door_descriptors
            .iter()
            .filter(|d| d.kind == DoorKind::Bonus)
            .collect();
        let on_bonus_edge = bonus_doors.iter().all(|d| d.references(*bonus));
        if bonus_doors.len() != 1 || !on_bonus_edge {
            defects.push(LevelDefect::BonusDoorCount(bonus_doors.len()));
        }

        let code = bonus_doors.first().and_then(|d| match d.lock {
            DoorLock::Code { digits } => Some(digits),
            DoorLock::Key { .. } => None,
        });
        for (index, clue) in self.clues.iter().enumerate() {
            let digit = clue.and_then(|c| c.digit);
            if code.is_none() || digit != code.map(|c| c[index]) || self.bonus_code != code {
                defects.push(LevelDefect::ClueMismatch { index });
            }
        }

        let handed_out = self
            .chests
            .iter()
            .flat_map(|c| c.items.iter())
            .chain(self.creatures.iter().flat_map(|c| c.inventory.iter()))
            .filter(|item| matches!(item, Item::Clue(_)))
            .count();
        if handed_out != BONUS_CODE_LEN {
            defects.push(LevelDefect::CluesHandedOut(handed_out));
        }
    }

    fn verify_cells(&self, defects: &mut Vec<LevelDefect>) {
        for (cell, kind) in self.cells.iter() {
            if self.cells.shade_pass(cell) > 0 && !kind.is_wall() {
                defects.push(LevelDefect::ShadedNonWall { x: cell.x, y: cell.y });
            }
        }
        for door in &self.door_descriptors {
            let (x, y) = (door.cell.x, door.cell.y);
            if self.points.kind(door.from) == PointKind::None
                || self.points.kind(door.to) == PointKind::None
            {
                defects.push(LevelDefect::OrphanedDoor { x, y });
            }
            if self.cells.kind(door.cell) != door.cell_kind() {
                defects.push(LevelDefect::DoorCellMismatch { x, y });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, LadderDirection};
    use crate::population::items::Stat;

    fn level(seed: u64) -> Level {
        let config = GenerationConfig::for_difficulty(Difficulty::Easy);
        let params = FloorParams::first_floor(LadderDirection::Down);
        let mut rng = FloorRng::seeded(seed);
        generate_level(&config, params, &mut rng).expect("easy floor generates")
    }

    #[test]
    fn test_generated_level_verifies() {
        let level = level(42);
        let defects = level.verify();
        assert!(defects.is_empty(), "Defects: {:?}", defects);
    }

    #[test]
    fn test_verify_flags_misplaced_key_rooms() {
        let config = GenerationConfig::for_difficulty(Difficulty::Hard);
        let params = FloorParams::first_floor(LadderDirection::Down);
        let (level, index) = (0..64)
            .find_map(|seed| {
                let mut rng = FloorRng::seeded(seed);
                let level = generate_level(&config, params.clone(), &mut rng).ok()?;
                let index = level
                    .door_descriptors
                    .iter()
                    .position(|d| d.kind == DoorKind::Usual)?;
                Some((level, index))
            })
            .expect("some Hard floor has a usual door");
        assert!(level.verify().is_empty());

        let door = level.door_descriptors[index];
        let (x, y) = (door.cell.x, door.cell.y);

        let mut onto_endpoint = level.clone();
        onto_endpoint.door_descriptors[index].key_point = Some(door.to);
        let defects = onto_endpoint.verify();
        assert!(defects.contains(&LevelDefect::KeyRoomNotUsual { x, y }), "{:?}", defects);
        assert!(defects.contains(&LevelDefect::KeyHolderOutsideRoom { x, y }));

        let mut entrance_key = level.clone();
        let entrance = entrance_key.points.find(PointKind::RoomEntrance);
        entrance_key.door_descriptors[index].key_point = entrance;
        assert!(entrance_key.verify().contains(&LevelDefect::KeyRoomNotUsual { x, y }));

        let mut stray_holder = level.clone();
        if let DoorLock::Key { holder, .. } = &mut stray_holder.door_descriptors[index].lock {
            *holder = CellCoord::new(0, 0);
        }
        let defects = stray_holder.verify();
        assert!(defects.contains(&LevelDefect::KeyHolderOutsideRoom { x, y }), "{:?}", defects);
        assert!(!defects.contains(&LevelDefect::KeyRoomNotUsual { x, y }));
    }

    #[test]
    fn test_discovered_mask_roundtrip() {
        let mut level = level(3);
        let cell = CellCoord::new(10, 7);
        assert!(!level.is_discovered(cell));
        assert_eq!(level.minimap_tile(cell), MinimapTile::Hidden);
        level.set_discovered(cell, true);
        assert!(level.is_discovered(cell));
        assert_ne!(level.minimap_tile(cell), MinimapTile::Hidden);
        level.set_discovered(cell, false);
        assert!(!level.is_discovered(cell));
        level.set_discovered(CellCoord::new(10_000, 0), true);
    }

    #[test]
    fn test_add_and_remove_entity() {
        let mut level = level(5);
        let before = level.blocks.len();
        let id = level.add_entity(Entity::Block(Block {
            id: EntityId(0),
            cell: CellCoord::new(0, 0),
            pos: WorldPos::default(),
        }));
        assert_eq!(level.blocks.len(), before + 1);
        let removed = level.remove_entity(id).expect("block was added");
        assert_eq!(removed.id(), id);
        assert_eq!(level.blocks.len(), before);
        assert!(level.remove_entity(id).is_none());
    }

    #[test]
    fn test_spawn_creature_on_spawn_site() {
        let mut level = level(11);
        let mut rng = FloorRng::seeded(1);
        let floor = level
            .cells
            .iter()
            .find(|(_, k)| *k == CellKind::Floor)
            .map(|(c, _)| c)
            .expect("floor has floor cells");
        let id = level.spawn_creature(floor, &mut rng).expect("floor is walkable");
        assert_eq!(level.creature(id).map(|c| c.cell), Some(floor));
        assert!(level.spawn_creature(CellCoord::new(0, 0), &mut rng).is_none());
    }

    #[test]
    fn test_activate_effect_changes_stats() {
        let mut level = level(8);
        let id = level.creatures[0].id;
        let before = level.creatures[0].stats.get(Stat::Health);
        level.activate_effect(id, StatEffect { stat: Stat::Health, percent: 100 });
        assert_eq!(level.creature(id).map(|c| c.stats.get(Stat::Health)), Some(before * 2));
    }

    #[test]
    #[should_panic(expected = "without owning creature")]
    fn test_activate_effect_without_owner_panics() {
        let mut level = level(8);
        level.activate_effect(EntityId(u64::MAX), StatEffect { stat: Stat::Mana, percent: 5 });
    }
}
