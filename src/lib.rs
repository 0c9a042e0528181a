//! Dungeon Floor - Procedural Core Library
//!
//! Deterministic generation of a single dungeon floor:
//! - Connection-point topology (entrance, exit, boss, bonus, corridors)
//! - Point-level and cell-level reachability
//! - Cell carving: rooms, tunnels, four-pass wall shading, ladders
//! - Door and key puzzle distribution (key guardians, bonus door code)
//! - Population pass: chests, monsters, loot with difficulty-scaled effects
//! - Level orchestration with a bounded whole-floor retry loop
//! - Bevy plugin, Monte-Carlo survey and ASCII rendering on top

pub mod carver;
pub mod config;
pub mod connectivity;
pub mod constants;
pub mod doors;
pub mod error;
pub mod grid;
pub mod level;
pub mod logging;
pub mod plugin;
pub mod population;
pub mod rng;
pub mod survey;
pub mod topology;
pub mod visualization;
