//! Equipment set effects.
//!
//! A set effect is active while every item of its set is worn. Effects
//! are kept in a registry and applied in registration order, so two
//! active effects compose predictably.

use serde::{Deserialize, Serialize};

use crate::components::CombatClass;
use crate::items::{Equipment, ItemId};
use crate::math::scale_percent;

/// What an active set does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetEffectKind {
    /// Melee accuracy and strength +10%.
    VoidMelee,
    /// Ranged accuracy and strength +10%.
    VoidRanged,
    /// Magic accuracy +45%.
    VoidMagic,
    /// Melee max hit grows with missing hitpoints.
    Dharok,
    /// Incoming damage reduced by `defence bonus / 3000`.
    Justiciar,
    /// Reflects part of incoming damage back to the attacker.
    Recoil {
        /// Percent of damage reflected, plus one.
        percent: i64,
    },
}

/// A named set of items with an effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEffect {
    /// Display name.
    pub name: String,
    /// Items that must all be worn.
    pub items: Vec<ItemId>,
    /// Effect granted.
    pub kind: SetEffectKind,
}

impl SetEffect {
    /// Whether every item of the set is worn.
    #[must_use]
    pub fn is_active(&self, equipment: &Equipment) -> bool {
        !self.items.is_empty() && self.items.iter().all(|&id| equipment.is_wearing(id))
    }
}

/// Attacker-side multipliers, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackModifiers {
    /// Scales the effective accuracy level.
    pub accuracy: i64,
    /// Scales the effective strength level.
    pub strength: i64,
    /// Scales the final max hit.
    pub max_hit: i64,
}

impl Default for AttackModifiers {
    fn default() -> Self {
        Self {
            accuracy: 100,
            strength: 100,
            max_hit: 100,
        }
    }
}

/// Ordered collection of set effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEffectRegistry {
    effects: Vec<SetEffect>,
}

impl SetEffectRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect. Later effects apply after earlier ones.
    pub fn register(&mut self, effect: SetEffect) {
        self.effects.push(effect);
    }

    /// Number of registered effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effects are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effects active for a set of equipment, in registration order.
    pub fn active<'a>(
        &'a self,
        equipment: &'a Equipment,
    ) -> impl Iterator<Item = SetEffectKind> + 'a {
        self.effects
            .iter()
            .filter(move |effect| effect.is_active(equipment))
            .map(|effect| effect.kind)
    }

    /// Attacker multipliers for an attack of `class`.
    #[must_use]
    pub fn attack_modifiers(
        &self,
        equipment: &Equipment,
        class: CombatClass,
        current_hitpoints: i32,
        base_hitpoints: i32,
    ) -> AttackModifiers {
        self.active(equipment)
            .fold(AttackModifiers::default(), |mut mods, kind| {
                match (kind, class) {
                    (SetEffectKind::VoidMelee, CombatClass::Melee)
                    | (SetEffectKind::VoidRanged, CombatClass::Ranged) => {
                        mods.accuracy = scale_percent(mods.accuracy, 110);
                        mods.strength = scale_percent(mods.strength, 110);
                    }
                    (SetEffectKind::VoidMagic, CombatClass::Magic) => {
                        mods.accuracy = scale_percent(mods.accuracy, 145);
                    }
                    (SetEffectKind::Dharok, CombatClass::Melee) => {
                        let missing = i64::from((base_hitpoints - current_hitpoints).max(0));
                        let percent = 100 + missing * i64::from(base_hitpoints.max(0)) / 100;
                        mods.max_hit = scale_percent(mods.max_hit, percent);
                    }
                    _ => {}
                }
                mods
            })
    }

    /// Damage after defender-side reductions.
    #[must_use]
    pub fn reduce_incoming(&self, equipment: &Equipment, damage: i32, defence_bonus: i32) -> i32 {
        self.active(equipment).fold(damage, |damage, kind| match kind {
            SetEffectKind::Justiciar => {
                let blocked = i64::from(damage) * i64::from(defence_bonus.max(0)) / 3000;
                (i64::from(damage) - blocked).max(0) as i32
            }
            _ => damage,
        })
    }

    /// Damage reflected to the attacker when `damage` lands on the wearer.
    #[must_use]
    pub fn recoil(&self, equipment: &Equipment, damage: i32) -> Option<i32> {
        if damage <= 0 {
            return None;
        }
        self.active(equipment).find_map(|kind| match kind {
            SetEffectKind::Recoil { percent } => {
                Some(scale_percent(i64::from(damage), percent) as i32 + 1)
            }
            _ => None,
        })
    }
}

impl FromIterator<SetEffect> for SetEffectRegistry {
    fn from_iter<T: IntoIterator<Item = SetEffect>>(iter: T) -> Self {
        Self {
            effects: iter.into_iter().collect(),
        }
    }
}
