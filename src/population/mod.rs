//! Population pass
//!
//! Walks the finished cell grid and turns every marker cell into an entity:
//! - chests (regular and bonus) with rolled loot
//! - monsters and the boss, equipped through `monsters::equip_monster`
//! - door entities for every door cell
//! - static collision blocks for walls touching walkable space
//! - a glow effect on each ladder
//!
//! Keys go to the creatures standing on their holder cells, then the bonus
//! code is written into the clue items and handed out.

pub mod items;
pub mod monsters;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::carver::{CellGrid, CellKind};
use crate::config::DifficultyScale;
use crate::constants::{BONUS_CHEST_POWER_MULT, BONUS_CODE_LEN, CELL_SIZE_PX, CHEST_SPRITE_PX};
use crate::doors::{DoorDescriptor, DoorKind, DoorLock, DoorOrientation};
use crate::grid::{cell_center_world, cell_to_world, CellCoord, WorldPos};
use crate::level::FloorDraft;
use crate::rng::FloorRng;
use crate::topology::PointKind;

use items::{roll_chest_items, ClueItem, Item, KeyItem, PowerBudget};
use monsters::{equip_monster, CreatureKind, Equipment, StatBlock};

/// Stable handle of one placed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: EntityId,
    pub kind: CreatureKind,
    pub cell: CellCoord,
    pub pos: WorldPos,
    pub stats: StatBlock,
    pub equipment: Equipment,
    pub inventory: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chest {
    pub id: EntityId,
    pub cell: CellCoord,
    /// Sprite anchor, inset so the sprite stays inside its cell
    pub pos: WorldPos,
    pub bonus: bool,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorEntity {
    pub id: EntityId,
    pub cell: CellCoord,
    pub pos: WorldPos,
    pub kind: DoorKind,
    pub orientation: DoorOrientation,
    pub lock: DoorLock,
}

/// Static collision object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: EntityId,
    pub cell: CellCoord,
    pub pos: WorldPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicEffectKind {
    LadderGlow,
}

/// Visual effect slot, optionally attached to a creature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphicEffect {
    pub id: EntityId,
    pub kind: GraphicEffectKind,
    pub cell: CellCoord,
    pub pos: WorldPos,
    pub owner: Option<EntityId>,
}

/// Where one clue ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClueHolder {
    Chest(usize),
    Creature(usize),
}

/// Entities produced from one floor draft
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub creatures: Vec<Creature>,
    pub chests: Vec<Chest>,
    pub doors: Vec<DoorEntity>,
    pub blocks: Vec<Block>,
    pub graphic_effects: Vec<GraphicEffect>,
    pub clues: [Option<ClueItem>; BONUS_CODE_LEN],
    /// Cells that held a monster marker when generation finished
    pub spawn_sites: Vec<CellCoord>,
    pub next_id: u64,
}

impl Population {
    fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Build an equipped creature standing on `cell`
pub fn build_creature(
    id: EntityId,
    kind: CreatureKind,
    cell: CellCoord,
    depth: u32,
    budget: &PowerBudget,
    scale: DifficultyScale,
    rng: &mut FloorRng,
) -> Creature {
    Creature {
        id,
        kind,
        cell,
        pos: cell_center_world(cell),
        stats: StatBlock::for_creature(kind, depth),
        equipment: equip_monster(kind, budget, scale, rng),
        inventory: Vec::new(),
    }
}

fn chest_anchor(cell: CellCoord) -> WorldPos {
    let corner = cell_to_world(cell);
    let inset = (CELL_SIZE_PX - CHEST_SPRITE_PX) / 2.0;
    WorldPos::new(corner.x + inset, corner.y + inset)
}

fn touches_walkable(cells: &CellGrid, cell: CellCoord) -> bool {
    cell.neighbors8(cells.size())
        .any(|n| cells.kind(n).is_floor_bearing())
}

/// Decide the holder of every clue: random regular chests first, otherwise
/// random non-boss creatures. `None` when neither exists.
pub fn choose_clue_holders(
    regular_chests: &[usize],
    non_boss_creatures: &[usize],
    rng: &mut FloorRng,
) -> Option<[ClueHolder; BONUS_CODE_LEN]> {
    if !regular_chests.is_empty() {
        return Some(std::array::from_fn(|_| {
            ClueHolder::Chest(regular_chests[rng.index(regular_chests.len())])
        }));
    }
    if !non_boss_creatures.is_empty() {
        return Some(std::array::from_fn(|_| {
            ClueHolder::Creature(non_boss_creatures[rng.index(non_boss_creatures.len())])
        }));
    }
    None
}

/// Random floor cell for a creature nobody asked for: inside an ordinary
/// room when possible, else anywhere on plain floor
fn synthesize_site(draft: &FloorDraft, rng: &mut FloorRng) -> Option<CellCoord> {
    let mut in_rooms = Vec::new();
    for p in draft.points.points_of(PointKind::RoomUsual) {
        if let Some(room) = draft.points.room(p) {
            let center = room.center();
            in_rooms.extend(
                room.interior()
                    .filter(|c| *c != center && draft.cells.kind(*c) == CellKind::Floor),
            );
        }
    }
    if let Some(cell) = rng.pick(&in_rooms) {
        return Some(*cell);
    }
    let anywhere: Vec<CellCoord> = draft
        .cells
        .iter()
        .filter(|(_, kind)| *kind == CellKind::Floor)
        .map(|(cell, _)| cell)
        .collect();
    rng.pick(&anywhere).copied()
}

fn door_at(doors: &[DoorDescriptor], cell: CellCoord) -> Option<&DoorDescriptor> {
    doors.iter().find(|d| d.cell == cell)
}

/// Convert the draft's marker cells into entities
pub fn populate(draft: &mut FloorDraft, rng: &mut FloorRng) -> Population {
    let depth = draft.params.depth;
    let scale = draft.scale;
    let budget = PowerBudget::for_floor(depth, draft.difficulty);
    let terminal = draft.params.is_terminal();
    let mut pop = Population::default();

    let cells: Vec<(CellCoord, CellKind)> = draft.cells.iter().collect();
    for (cell, kind) in cells {
        match kind {
            CellKind::FloorAndChest | CellKind::FloorAndChestBonus => {
                let bonus = kind == CellKind::FloorAndChestBonus;
                let chest_budget = if bonus {
                    budget.scaled(BONUS_CHEST_POWER_MULT)
                } else {
                    budget
                };
                let id = pop.alloc();
                pop.chests.push(Chest {
                    id,
                    cell,
                    pos: chest_anchor(cell),
                    bonus,
                    items: roll_chest_items(&chest_budget, scale, rng),
                });
            }
            CellKind::FloorAndMonster => {
                let id = pop.alloc();
                pop.creatures.push(build_creature(
                    id,
                    CreatureKind::Monster,
                    cell,
                    depth,
                    &budget,
                    scale,
                    rng,
                ));
                pop.spawn_sites.push(cell);
            }
            CellKind::FloorAndMonsterBoss => {
                let id = pop.alloc();
                let mut boss =
                    build_creature(id, CreatureKind::Boss, cell, depth, &budget, scale, rng);
                if terminal {
                    boss.equipment.grant_special_artifact();
                }
                pop.creatures.push(boss);
            }
            k if k.is_door() => {
                if let Some(door) = door_at(&draft.doors, cell) {
                    let id = pop.alloc();
                    pop.doors.push(DoorEntity {
                        id,
                        cell,
                        pos: cell_center_world(cell),
                        kind: door.kind,
                        orientation: door.orientation,
                        lock: door.lock,
                    });
                }
            }
            k if k.is_ladder() => {
                let id = pop.alloc();
                pop.graphic_effects.push(GraphicEffect {
                    id,
                    kind: GraphicEffectKind::LadderGlow,
                    cell,
                    pos: cell_center_world(cell),
                    owner: None,
                });
            }
            k if k.is_wall() && touches_walkable(&draft.cells, cell) => {
                let id = pop.alloc();
                pop.blocks.push(Block {
                    id,
                    cell,
                    pos: cell_to_world(cell),
                });
            }
            _ => {}
        }
    }

    hand_out_keys(&draft.doors, &mut pop);
    hand_out_clues(draft, &mut pop, &budget, rng);

    debug!(
        creatures = pop.creatures.len(),
        chests = pop.chests.len(),
        doors = pop.doors.len(),
        blocks = pop.blocks.len(),
        "floor populated"
    );
    pop
}

fn hand_out_keys(doors: &[DoorDescriptor], pop: &mut Population) {
    for door in doors {
        let DoorLock::Key { color, holder } = door.lock else {
            continue;
        };
        match pop.creatures.iter_mut().find(|c| c.cell == holder) {
            Some(creature) => creature.inventory.push(Item::Key(KeyItem {
                door_cell: door.cell,
                color,
            })),
            None => trace!(x = holder.x, y = holder.y, "key holder cell has no creature"),
        }
    }
}

fn hand_out_clues(
    draft: &mut FloorDraft,
    pop: &mut Population,
    budget: &PowerBudget,
    rng: &mut FloorRng,
) {
    let Some(digits) = draft.bonus_code else {
        return;
    };
    let mut clues = draft.params.clues;
    for (clue, digit) in clues.iter_mut().zip(digits) {
        clue.digit = Some(digit);
    }

    let regular: Vec<usize> = (0..pop.chests.len())
        .filter(|i| !pop.chests[*i].bonus)
        .collect();
    let mut carriers: Vec<usize> = (0..pop.creatures.len())
        .filter(|i| pop.creatures[*i].kind == CreatureKind::Monster)
        .collect();

    if regular.is_empty() && carriers.is_empty() {
        if let Some(cell) = synthesize_site(draft, rng) {
            draft.cells.set(cell, CellKind::FloorAndMonster);
            let id = pop.alloc();
            pop.creatures.push(build_creature(
                id,
                CreatureKind::Monster,
                cell,
                draft.params.depth,
                budget,
                draft.scale,
                rng,
            ));
            pop.spawn_sites.push(cell);
            carriers.push(pop.creatures.len() - 1);
            trace!(x = cell.x, y = cell.y, "synthesized clue carrier");
        }
    }

    let Some(holders) = choose_clue_holders(&regular, &carriers, rng) else {
        return;
    };
    for (clue, holder) in clues.into_iter().zip(holders) {
        match holder {
            ClueHolder::Chest(i) => pop.chests[i].items.push(Item::Clue(clue)),
            ClueHolder::Creature(i) => pop.creatures[i].inventory.push(Item::Clue(clue)),
        }
    }
    pop.clues = clues.map(Some);
}
