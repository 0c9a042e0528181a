//! Centralized generation constants for the dungeon procedural core.
//!
//! Every probability is a percentage in `0.0..=100.0` before the difficulty
//! multiplier (`base_chance_procent / 100`) is applied. Which chances are scaled
//! is decided at the call site via `DifficultyScale`.

// =====================================================
// Grid Geometry
// =====================================================

/// Size of one cell (render block) in world pixels
pub const CELL_SIZE_PX: f32 = 32.0;

/// Smallest interior side of a carved room
pub const MIN_ROOM_LEN: usize = 5;

/// Cells between a room's wall border and the edge of its point block
pub const ROOM_MARGIN: usize = 2;

/// Interior side of a ladder room (one ladder cell)
pub const LADDER_ROOM_LEN: usize = 1;

// =====================================================
// Topology
// =====================================================

/// Chance a free point becomes a pass-through corner
pub const CORNER_CHANCE: f32 = 10.0;

/// Chance a free point (not a corner) becomes an ordinary room
pub const ROOM_CHANCE: f32 = 65.0;

/// Chance to stop branching after a point made its first connection
pub const STOP_BRANCHING_CHANCE: f32 = 30.0;

// =====================================================
// Room Contents
// =====================================================

/// Chance an ordinary room gets a chest marker at its centre (scaled)
pub const ROOM_CHEST_CHANCE: f32 = 50.0;

/// Chance a chest-less ordinary room gets an extra wall block (unscaled)
pub const EXTRA_WALL_BLOCK_CHANCE: f32 = 50.0;

/// Number of monster-spawn rolls in the ring around a room centre
pub const MONSTER_SPAWN_TRIES: usize = 8;

/// Chance one monster-spawn roll misses (scaled)
pub const MONSTER_SPAWN_MISS_CHANCE: f32 = 90.0;

// =====================================================
// Doors & Keys
// =====================================================

/// Chance a qualifying dead-end / pass-through room gets a usual door
pub const USUAL_DOOR_CHANCE: f32 = 50.0;

/// Number of digits in a bonus door code
pub const BONUS_CODE_LEN: usize = 4;

// =====================================================
// Loot & Equipment
// =====================================================

/// Chance a regular monster skips one equipment slot (scaled)
pub const MONSTER_EQUIPMENT_MISS_CHANCE: f32 = 95.0;

/// Chance a boss skips one equipment slot (scaled)
pub const BOSS_EQUIPMENT_MISS_CHANCE: f32 = 10.0;

/// Potion slots rolled per monster
pub const MONSTER_POTION_SLOTS: usize = 3;

/// Item category gates, checked in order
pub const ITEM_POTION_CHANCE: f32 = 60.0;
pub const ITEM_HELMET_CHANCE: f32 = 20.0;
pub const ITEM_ARMOUR_CHANCE: f32 = 20.0;
pub const ITEM_SWORD_CHANCE: f32 = 15.0;
pub const ITEM_ARTIFACT_CHANCE: f32 = 0.2;

/// Odds that a freely settable stat rolls a positive effect (scaled)
pub const EFFECT_PLUS_CHANCE: f32 = 25.0;

/// Odds that a freely settable stat rolls a negative effect (unscaled)
pub const EFFECT_MINUS_CHANCE: f32 = 10.0;

/// Full sweeps over the stat order before effect rolling gives up
pub const MAX_EFFECT_PASSES: usize = 16;

/// Flat bonus of the terminal boss's special artifact (percent, all stats but speed)
pub const SPECIAL_ARTIFACT_BONUS: i32 = 20;

/// Power budget growth per dungeon depth
pub const DEPTH_POWER_STEP: f32 = 0.15;

/// Effect magnitude per unit of power budget (percent)
pub const EFFECT_MAGNITUDE_PER_POWER: f32 = 5.0;

/// Item slots rolled per regular chest
pub const CHEST_ITEM_SLOTS: usize = 2;

/// Power multiplier applied to bonus-room chests
pub const BONUS_CHEST_POWER_MULT: f32 = 2.0;

/// Boss base-stat multiplier
pub const BOSS_STAT_MULT: i32 = 3;

/// Chest sprite side in pixels; chests are anchored so the sprite sits inside its cell
pub const CHEST_SPRITE_PX: f32 = 24.0;

// =====================================================
// Orchestration
// =====================================================

/// Default cap on whole-floor generation attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 500;
