//! Item rolling: categories, stat-effect directives and the power budget.
//!
//! The budget grows with depth and difficulty. It multiplies the rarer item
//! gates, caps how many effects an item gets and bounds each effect's size.

use serde::{Deserialize, Serialize};

use crate::config::{Difficulty, DifficultyScale};
use crate::constants::{
    BONUS_CODE_LEN, CHEST_ITEM_SLOTS, DEPTH_POWER_STEP, EFFECT_MAGNITUDE_PER_POWER,
    EFFECT_MINUS_CHANCE, EFFECT_PLUS_CHANCE, ITEM_ARMOUR_CHANCE, ITEM_ARTIFACT_CHANCE,
    ITEM_HELMET_CHANCE, ITEM_POTION_CHANCE, ITEM_SWORD_CHANCE, MAX_EFFECT_PASSES,
    SPECIAL_ARTIFACT_BONUS,
};
use crate::doors::KeyColor;
use crate::grid::CellCoord;
use crate::rng::FloorRng;

/// Character stats an effect can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Health,
    Mana,
    Strength,
    Agility,
    Intellect,
    Armour,
    Damage,
    CriticalChance,
    Speed,
}

impl Stat {
    pub const COUNT: usize = 9;

    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::Health,
        Stat::Mana,
        Stat::Strength,
        Stat::Agility,
        Stat::Intellect,
        Stat::Armour,
        Stat::Damage,
        Stat::CriticalChance,
        Stat::Speed,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// What an item may do to one stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatDirective {
    NotSet,
    CanSet,
    CanSetPlus,
    CanSetMinus,
    MustSetPlus,
    MustSetMinus,
}

impl StatDirective {
    fn is_optional(&self) -> bool {
        matches!(
            self,
            StatDirective::CanSet | StatDirective::CanSetPlus | StatDirective::CanSetMinus
        )
    }
}

pub type DirectiveTable = [StatDirective; Stat::COUNT];

/// Signed percentage change to one stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEffect {
    pub stat: Stat,
    pub percent: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Potion,
    Helmet,
    Armour,
    Sword,
    Artifact,
    /// Terminal boss reward, built outside the probability tables
    SpecialArtifact,
}

impl ItemKind {
    /// Directives indexed by `Stat::index`
    #[rustfmt::skip]
    pub fn directives(&self) -> DirectiveTable {
        use StatDirective::*;
        match self {
            // Health, Mana, Strength, Agility, Intellect, Armour, Damage, CriticalChance, Speed
            ItemKind::Potion => [MustSetPlus, CanSetPlus, CanSet, CanSet, CanSet, NotSet, NotSet, NotSet, CanSet],
            ItemKind::Helmet => [CanSet, CanSet, NotSet, NotSet, CanSet, MustSetPlus, NotSet, CanSetMinus, NotSet],
            ItemKind::Armour => [CanSetPlus, NotSet, CanSet, CanSet, NotSet, MustSetPlus, NotSet, NotSet, CanSetMinus],
            ItemKind::Sword => [NotSet, NotSet, CanSet, CanSet, NotSet, NotSet, MustSetPlus, CanSetPlus, CanSet],
            ItemKind::Artifact => [CanSet; Stat::COUNT],
            ItemKind::SpecialArtifact => [NotSet; Stat::COUNT],
        }
    }
}

/// A piece of loot or equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub kind: ItemKind,
    pub effects: Vec<StatEffect>,
}

impl Gear {
    pub fn effect_on(&self, stat: Stat) -> Option<i32> {
        self.effects.iter().find(|e| e.stat == stat).map(|e| e.percent)
    }
}

/// Key to one door
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyItem {
    pub door_cell: CellCoord,
    pub color: KeyColor,
}

/// One of the four collectible bonus-code clues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueItem {
    /// Position of the digit in the code
    pub index: u8,
    pub digit: Option<u8>,
}

impl ClueItem {
    /// Four clues with no digits written yet
    pub fn blank_set() -> [ClueItem; BONUS_CODE_LEN] {
        std::array::from_fn(|i| ClueItem {
            index: i as u8,
            digit: None,
        })
    }
}

/// Anything a chest or creature can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Gear(Gear),
    Key(KeyItem),
    Clue(ClueItem),
}

/// Strength scalar for generated items
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerBudget {
    pub value: f32,
    /// Upper bound on optional effects per item
    pub max_effects: usize,
    /// Upper bound on one effect, in percent
    pub magnitude: i32,
}

impl PowerBudget {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            max_effects: (1 + value.floor() as usize).min(Stat::COUNT),
            magnitude: ((EFFECT_MAGNITUDE_PER_POWER * value).round() as i32).max(1),
        }
    }

    pub fn for_floor(depth: u32, difficulty: Difficulty) -> Self {
        Self::new((1.0 + DEPTH_POWER_STEP * depth as f32) * difficulty.power_factor())
    }

    pub fn scaled(&self, mult: f32) -> Self {
        Self::new(self.value * mult)
    }
}

/// Nested category gates; `None` is an empty slot
pub fn roll_item_kind(budget: &PowerBudget, rng: &mut FloorRng) -> Option<ItemKind> {
    let power = budget.value;
    if rng.percent(ITEM_POTION_CHANCE) {
        Some(ItemKind::Potion)
    } else if rng.percent(ITEM_HELMET_CHANCE * power) {
        Some(ItemKind::Helmet)
    } else if rng.percent(ITEM_ARMOUR_CHANCE * power) {
        Some(ItemKind::Armour)
    } else if rng.percent(ITEM_SWORD_CHANCE * power) {
        Some(ItemKind::Sword)
    } else if rng.percent(ITEM_ARTIFACT_CHANCE * power) {
        Some(ItemKind::Artifact)
    } else {
        None
    }
}

fn roll_magnitude(budget: &PowerBudget, rng: &mut FloorRng) -> i32 {
    1 + rng.index(budget.magnitude as usize) as i32
}

/// Roll stat effects under `directives`.
///
/// Mandatory stats are written first. Optional stats are then swept in a
/// fresh random order each pass, trying the positive odds before the
/// negative ones, until the budget's effect count is reached, no optional stat
/// is left, or `MAX_EFFECT_PASSES` sweeps went by.
pub fn set_effects(
    directives: &DirectiveTable,
    budget: &PowerBudget,
    scale: DifficultyScale,
    rng: &mut FloorRng,
) -> Vec<StatEffect> {
    let mut effects = Vec::new();
    let mut used = [false; Stat::COUNT];

    for stat in Stat::ALL {
        let sign = match directives[stat.index()] {
            StatDirective::MustSetPlus => 1,
            StatDirective::MustSetMinus => -1,
            _ => continue,
        };
        effects.push(StatEffect {
            stat,
            percent: sign * roll_magnitude(budget, rng),
        });
        used[stat.index()] = true;
    }

    let plus = scale.apply(EFFECT_PLUS_CHANCE);
    let mut optional = 0;
    for _ in 0..MAX_EFFECT_PASSES {
        if optional >= budget.max_effects {
            break;
        }
        let eligible = Stat::ALL
            .iter()
            .any(|s| !used[s.index()] && directives[s.index()].is_optional());
        if !eligible {
            break;
        }

        let mut order = Stat::ALL;
        rng.shuffle(&mut order);
        for stat in order {
            if optional >= budget.max_effects {
                break;
            }
            let directive = directives[stat.index()];
            if used[stat.index()] || !directive.is_optional() {
                continue;
            }
            let sign = match directive {
                StatDirective::CanSetPlus => rng.percent(plus).then_some(1),
                StatDirective::CanSetMinus => rng.percent(EFFECT_MINUS_CHANCE).then_some(-1),
                _ => {
                    if rng.percent(plus) {
                        Some(1)
                    } else {
                        rng.percent(EFFECT_MINUS_CHANCE).then_some(-1)
                    }
                }
            };
            if let Some(sign) = sign {
                effects.push(StatEffect {
                    stat,
                    percent: sign * roll_magnitude(budget, rng),
                });
                used[stat.index()] = true;
                optional += 1;
            }
        }
    }
    effects
}

pub fn roll_gear(
    kind: ItemKind,
    budget: &PowerBudget,
    scale: DifficultyScale,
    rng: &mut FloorRng,
) -> Gear {
    if kind == ItemKind::SpecialArtifact {
        return special_artifact();
    }
    Gear {
        kind,
        effects: set_effects(&kind.directives(), budget, scale, rng),
    }
}

/// Flat bonus on every stat but speed
pub fn special_artifact() -> Gear {
    Gear {
        kind: ItemKind::SpecialArtifact,
        effects: Stat::ALL
            .into_iter()
            .filter(|s| *s != Stat::Speed)
            .map(|stat| StatEffect {
                stat,
                percent: SPECIAL_ARTIFACT_BONUS,
            })
            .collect(),
    }
}

/// Contents of one chest: each slot rolls a category, empty slots are dropped
pub fn roll_chest_items(
    budget: &PowerBudget,
    scale: DifficultyScale,
    rng: &mut FloorRng,
) -> Vec<Item> {
    (0..CHEST_ITEM_SLOTS)
        .filter_map(|_| roll_item_kind(budget, rng))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|kind| Item::Gear(roll_gear(kind, budget, scale, rng)))
        .collect()
}
