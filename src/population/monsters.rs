//! Creature stats and equipment.

use serde::{Deserialize, Serialize};

use super::items::{roll_gear, special_artifact, Gear, ItemKind, PowerBudget, Stat, StatEffect};
use crate::config::DifficultyScale;
use crate::constants::{
    BOSS_EQUIPMENT_MISS_CHANCE, BOSS_STAT_MULT, MONSTER_EQUIPMENT_MISS_CHANCE,
    MONSTER_POTION_SLOTS,
};
use crate::rng::FloorRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureKind {
    Monster,
    Boss,
}

/// Raw stat values, indexed by `Stat::index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    values: [i32; Stat::COUNT],
}

impl StatBlock {
    /// Base stats for a creature on a floor of `depth`
    pub fn for_creature(kind: CreatureKind, depth: u32) -> Self {
        let d = depth as i32;
        let mut values = [
            30 + 10 * d, // health
            10 + 3 * d,  // mana
            5 + d,       // strength
            5 + d,       // agility
            3 + d,       // intellect
            2 + d,       // armour
            4 + 2 * d,   // damage
            5,           // critical chance
            100,         // speed
        ];
        if kind == CreatureKind::Boss {
            for stat in Stat::ALL {
                if !matches!(stat, Stat::CriticalChance | Stat::Speed) {
                    values[stat.index()] *= BOSS_STAT_MULT;
                }
            }
        }
        Self { values }
    }

    pub fn get(&self, stat: Stat) -> i32 {
        self.values[stat.index()]
    }

    /// Apply a percentage effect, never dropping a stat below zero
    pub fn apply(&mut self, effect: StatEffect) {
        let value = &mut self.values[effect.stat.index()];
        *value = (*value + *value * effect.percent / 100).max(0);
    }
}

/// Everything a creature wears or carries into a fight
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub armour: Option<Gear>,
    pub helmet: Option<Gear>,
    pub sword: Option<Gear>,
    pub potions: Vec<Gear>,
    pub artifact: Option<Gear>,
}

impl Equipment {
    pub fn pieces(&self) -> impl Iterator<Item = &Gear> {
        self.armour
            .iter()
            .chain(self.helmet.iter())
            .chain(self.sword.iter())
            .chain(self.potions.iter())
            .chain(self.artifact.iter())
    }

    /// Swap whatever artifact was rolled for the terminal boss reward
    pub fn grant_special_artifact(&mut self) {
        self.artifact = Some(special_artifact());
    }
}

/// Roll a creature's equipment. Every slot but the sword can be skipped by
/// the miss roll; bosses miss far less often.
pub fn equip_monster(
    kind: CreatureKind,
    budget: &PowerBudget,
    scale: DifficultyScale,
    rng: &mut FloorRng,
) -> Equipment {
    let miss = scale.apply(match kind {
        CreatureKind::Monster => MONSTER_EQUIPMENT_MISS_CHANCE,
        CreatureKind::Boss => BOSS_EQUIPMENT_MISS_CHANCE,
    });
    let slot = |item: ItemKind, rng: &mut FloorRng| {
        (!rng.percent(miss)).then(|| roll_gear(item, budget, scale, rng))
    };

    let armour = slot(ItemKind::Armour, rng);
    let helmet = slot(ItemKind::Helmet, rng);
    let sword = Some(roll_gear(ItemKind::Sword, budget, scale, rng));
    let potions = (0..MONSTER_POTION_SLOTS)
        .filter_map(|_| slot(ItemKind::Potion, rng))
        .collect();
    let artifact = slot(ItemKind::Artifact, rng);

    Equipment {
        armour,
        helmet,
        sword,
        potions,
        artifact,
    }
}
