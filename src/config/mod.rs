//! Generation configuration and per-floor parameters.
//!
//! `GenerationConfig` is the long-lived knob set (difficulty, retry budget,
//! logging) and can be loaded from JSON or RON. `FloorParams` describes one
//! floor: its depth, how it is entered and left, and the clue items the bonus
//! door code is written into.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_ATTEMPTS;
use crate::error::{GenerationError, Result};
use crate::grid::{Direction, PointCoord};
use crate::logging::TracingConfig;
use crate::population::items::ClueItem;

/// Floor difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Hardcore,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Hardcore,
    ];

    /// Connection points per grid axis
    pub fn points_per_axis(&self) -> usize {
        match self {
            Difficulty::Easy => 4,
            Difficulty::Normal => 5,
            Difficulty::Hard => 6,
            Difficulty::Hardcore => 7,
        }
    }

    /// Percentage multiplier applied to scaled chances
    pub fn base_chance_procent(&self) -> f32 {
        match self {
            Difficulty::Easy => 80.0,
            Difficulty::Normal => 55.0,
            Difficulty::Hard => 30.0,
            Difficulty::Hardcore => 5.0,
        }
    }

    /// Loot power multiplier; harder floors roll stronger (and harsher) items
    pub fn power_factor(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Normal => 1.25,
            Difficulty::Hard => 1.5,
            Difficulty::Hardcore => 2.0,
        }
    }

    pub fn scale(&self) -> DifficultyScale {
        DifficultyScale(self.base_chance_procent() / 100.0)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            "hardcore" => Some(Difficulty::Hardcore),
            _ => None,
        }
    }
}

/// Multiplier (`base_chance_procent / 100`) for difficulty-scaled chances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyScale(pub f32);

impl DifficultyScale {
    pub fn apply(&self, chance: f32) -> f32 {
        (chance * self.0).clamp(0.0, 100.0)
    }
}

/// Orientation of a ladder; `NoLadder` marks the first floor's entrance or the last floor's exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LadderDirection {
    NoLadder,
    Up,
    Down,
    Left,
    Right,
}

impl LadderDirection {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            LadderDirection::NoLadder => None,
            LadderDirection::Up => Some(Direction::Up),
            LadderDirection::Down => Some(Direction::Down),
            LadderDirection::Left => Some(Direction::Left),
            LadderDirection::Right => Some(Direction::Right),
        }
    }

    /// Side a ladder room opens toward (opposite its ladder)
    pub fn opening(&self) -> Option<Direction> {
        self.direction().map(|d| d.opposite())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "noladder" => Some(LadderDirection::NoLadder),
            "up" => Some(LadderDirection::Up),
            "down" => Some(LadderDirection::Down),
            "left" => Some(LadderDirection::Left),
            "right" => Some(LadderDirection::Right),
            _ => None,
        }
    }
}

/// Long-lived generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub difficulty: Difficulty,
    /// Cap on whole-floor restarts before giving up
    pub max_attempts: u32,
    /// Replaces the difficulty-driven grid size when set
    #[serde(default)]
    pub points_per_axis_override: Option<usize>,
    #[serde(default)]
    pub tracing: TracingConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            points_per_axis_override: None,
            tracing: TracingConfig::default(),
        }
    }
}

impl GenerationConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn points_per_axis(&self) -> usize {
        self.points_per_axis_override
            .unwrap_or_else(|| self.difficulty.points_per_axis())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(GenerationError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.points_per_axis() == 0 {
            return Err(GenerationError::InvalidConfig(
                "points_per_axis must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` or `.ron` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("ron") => Self::from_ron(&text),
            other => Err(GenerationError::InvalidConfig(format!(
                "unsupported config extension: {:?}",
                other
            ))),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Parameters of a single floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorParams {
    /// 1-based depth in the dungeon
    pub depth: u32,
    pub entrance: LadderDirection,
    /// Preferred entrance point (usually the previous floor's exit point)
    pub entrance_anchor: Option<PointCoord>,
    /// `NoLadder` makes this the terminal floor
    pub exit: LadderDirection,
    /// Collectible items the bonus door code is written into
    pub clues: [ClueItem; 4],
}

impl FloorParams {
    pub fn first_floor(exit: LadderDirection) -> Self {
        Self {
            depth: 1,
            entrance: LadderDirection::NoLadder,
            entrance_anchor: None,
            exit,
            clues: ClueItem::blank_set(),
        }
    }

    /// Parameters for the floor below one whose exit was `exit` at `exit_point`
    pub fn next_floor(&self, exit_point: PointCoord, next_exit: LadderDirection) -> Self {
        Self {
            depth: self.depth + 1,
            entrance: self.exit,
            entrance_anchor: Some(exit_point),
            exit: next_exit,
            clues: ClueItem::blank_set(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.exit == LadderDirection::NoLadder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_table() {
        let table: Vec<(usize, f32)> = Difficulty::ALL
            .iter()
            .map(|d| (d.points_per_axis(), d.base_chance_procent()))
            .collect();
        assert_eq!(table, vec![(4, 80.0), (5, 55.0), (6, 30.0), (7, 5.0)]);
    }

    #[test]
    fn test_scale_clamps() {
        let scale = Difficulty::Easy.scale();
        assert!((scale.apply(50.0) - 40.0).abs() < f32::EPSILON);
        assert_eq!(DifficultyScale(3.0).apply(50.0), 100.0);
    }

    #[test]
    fn test_ladder_opening_is_opposite() {
        assert_eq!(LadderDirection::Down.opening(), Some(Direction::Up));
        assert_eq!(LadderDirection::Left.opening(), Some(Direction::Right));
        assert_eq!(LadderDirection::NoLadder.opening(), None);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = GenerationConfig::for_difficulty(Difficulty::Hard);
        let restored = GenerationConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(restored.difficulty, Difficulty::Hard);
        assert_eq!(restored.max_attempts, config.max_attempts);
    }

    #[test]
    fn test_config_ron_minimal() {
        let config = GenerationConfig::from_ron(
            "(difficulty: Hardcore, max_attempts: 12, points_per_axis_override: Some(3))",
        )
        .unwrap();
        assert_eq!(config.difficulty, Difficulty::Hardcore);
        assert_eq!(config.points_per_axis(), 3);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = GenerationConfig::from_json(r#"{"difficulty":"Easy","max_attempts":0}"#)
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidConfig(_)));
    }

    #[test]
    fn test_next_floor_chains_ladders() {
        let first = FloorParams::first_floor(LadderDirection::Down);
        let second = first.next_floor(PointCoord::new(1, 2), LadderDirection::NoLadder);
        assert_eq!(second.depth, 2);
        assert_eq!(second.entrance, LadderDirection::Down);
        assert_eq!(second.entrance_anchor, Some(PointCoord::new(1, 2)));
        assert!(second.is_terminal());
        assert!(!first.is_terminal());
    }
}
