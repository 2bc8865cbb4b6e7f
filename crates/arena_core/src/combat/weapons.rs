//! Weapon descriptors.
//!
//! A weapon is pure data: a tagged kind (melee, ranged or magic) plus
//! speed, range and an optional special attack. The combat resolver
//! dispatches on the kind.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::components::{CombatClass, MeleeType, Skill, Stance};

/// A combat spell cast by a magic weapon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spell {
    /// Spell name.
    pub name: String,
    /// Base maximum hit before magic damage bonuses.
    pub max_hit: i32,
    /// Ticks the target is frozen on a successful hit (0 = no freeze).
    #[serde(default)]
    pub freeze_ticks: u32,
}

/// How a weapon attacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Close-range weapon of a given damage type.
    Melee {
        /// Damage type.
        melee_type: MeleeType,
    },
    /// Bows, crossbows and thrown weapons.
    Ranged,
    /// Staves casting a fixed spell.
    Magic {
        /// Spell cast on every attack.
        spell: Spell,
    },
}

impl WeaponKind {
    /// Combat class of this kind.
    #[must_use]
    pub const fn class(&self) -> CombatClass {
        match self {
            Self::Melee { .. } => CombatClass::Melee,
            Self::Ranged => CombatClass::Ranged,
            Self::Magic { .. } => CombatClass::Magic,
        }
    }
}

/// Special attack behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialAttack {
    /// One swing with boosted accuracy and damage.
    Boosted {
        /// Accuracy multiplier in percent.
        accuracy: i64,
        /// Max hit multiplier in percent.
        damage: i64,
    },
    /// Two independently rolled swings.
    DoubleHit {
        /// Accuracy multiplier in percent.
        accuracy: i64,
        /// Max hit multiplier in percent.
        damage: i64,
    },
    /// One swing that lowers a defender stat by the damage dealt.
    Drain {
        /// Stat lowered on a successful hit.
        skill: Skill,
        /// Accuracy multiplier in percent.
        accuracy: i64,
        /// Max hit multiplier in percent.
        damage: i64,
    },
    /// A swing that reaches the target faster.
    QuickShot {
        /// Ticks removed from the hit delivery delay.
        delay_reduction: u32,
        /// Accuracy multiplier in percent.
        accuracy: i64,
    },
}

impl SpecialAttack {
    /// Accuracy multiplier in percent.
    #[must_use]
    pub const fn accuracy_percent(self) -> i64 {
        match self {
            Self::Boosted { accuracy, .. }
            | Self::DoubleHit { accuracy, .. }
            | Self::Drain { accuracy, .. }
            | Self::QuickShot { accuracy, .. } => accuracy,
        }
    }

    /// Max hit multiplier in percent.
    #[must_use]
    pub const fn damage_percent(self) -> i64 {
        match self {
            Self::Boosted { damage, .. }
            | Self::DoubleHit { damage, .. }
            | Self::Drain { damage, .. } => damage,
            Self::QuickShot { .. } => 100,
        }
    }

    /// Number of swings rolled.
    #[must_use]
    pub const fn swings(self) -> usize {
        match self {
            Self::DoubleHit { .. } => 2,
            _ => 1,
        }
    }
}

/// A special attack together with its energy cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecialSpec {
    /// Energy consumed, out of 100.
    pub energy_cost: u32,
    /// Behaviour.
    pub attack: SpecialAttack,
}

/// A complete weapon descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Weapon {
    /// Display name. Also keys protection-prayer overrides.
    pub name: String,
    /// Attack kind.
    pub kind: WeaponKind,
    /// Ticks between attacks.
    pub attack_speed: u32,
    /// Attack range in tiles.
    pub range: i32,
    /// Optional special attack.
    #[serde(default)]
    pub special: Option<SpecialSpec>,
    /// Fixed max hit replacing the strength formula (NPC weapons).
    #[serde(default)]
    pub fixed_max_hit: Option<i32>,
}

/// Longest range any attack may have.
pub const MAX_ATTACK_RANGE: i32 = 10;

impl Weapon {
    /// The weapon used when nothing is equipped.
    #[must_use]
    pub fn unarmed() -> &'static Self {
        static UNARMED: OnceLock<Weapon> = OnceLock::new();
        UNARMED.get_or_init(|| Self {
            name: "Unarmed".to_string(),
            kind: WeaponKind::Melee {
                melee_type: MeleeType::Crush,
            },
            attack_speed: 4,
            range: 1,
            special: None,
            fixed_max_hit: None,
        })
    }

    /// Combat class of this weapon.
    #[must_use]
    pub const fn class(&self) -> CombatClass {
        self.kind.class()
    }

    /// Whether this weapon offers a stance.
    #[must_use]
    pub fn offers(&self, stance: Stance) -> bool {
        Stance::offered_by(self.class()).contains(&stance)
    }

    /// Attack speed adjusted for a stance, never below one tick.
    #[must_use]
    pub fn speed_with(&self, stance: Stance) -> u32 {
        let delta = stance.bonus(self.class()).speed;
        self.attack_speed.saturating_add_signed(delta).max(1)
    }

    /// Attack range adjusted for a stance, capped at [`MAX_ATTACK_RANGE`].
    #[must_use]
    pub fn range_with(&self, stance: Stance) -> i32 {
        (self.range + stance.bonus(self.class()).range).clamp(1, MAX_ATTACK_RANGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortbow() -> Weapon {
        Weapon {
            name: "Shortbow".to_string(),
            kind: WeaponKind::Ranged,
            attack_speed: 4,
            range: 7,
            special: None,
            fixed_max_hit: None,
        }
    }

    #[test]
    fn test_unarmed_is_melee() {
        let fists = Weapon::unarmed();
        assert_eq!(fists.class(), CombatClass::Melee);
        assert_eq!(fists.range, 1);
        assert!(fists.offers(Stance::Controlled));
        assert!(!fists.offers(Stance::Rapid));
    }

    #[test]
    fn test_rapid_and_longrange_adjust_bow() {
        let bow = shortbow();
        assert_eq!(bow.speed_with(Stance::Rapid), 3);
        assert_eq!(bow.speed_with(Stance::Accurate), 4);
        assert_eq!(bow.range_with(Stance::Longrange), 9);
    }

    #[test]
    fn test_range_is_capped() {
        let mut bow = shortbow();
        bow.range = 10;
        assert_eq!(bow.range_with(Stance::Longrange), MAX_ATTACK_RANGE);
    }

    #[test]
    fn test_special_multipliers() {
        let dds = SpecialAttack::DoubleHit {
            accuracy: 125,
            damage: 115,
        };
        assert_eq!(dds.swings(), 2);
        assert_eq!(dds.accuracy_percent(), 125);
        let quick = SpecialAttack::QuickShot {
            delay_reduction: 1,
            accuracy: 100,
        };
        assert_eq!(quick.damage_percent(), 100);
    }
}
