//! Unit data types.
//!
//! Components are mostly plain data: stat blocks, equipment bonuses,
//! prayers and stances. Behaviour that needs the world lives in the
//! simulation and combat modules.

use std::collections::BTreeMap;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

// ============================================================================
// Skills & Stats
// ============================================================================

/// A trainable skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    /// Melee accuracy.
    Attack,
    /// Melee damage.
    Strength,
    /// Defence against every style.
    Defence,
    /// Ranged accuracy and damage.
    Ranged,
    /// Magic accuracy and magic defence.
    Magic,
    /// Health pool.
    Hitpoint,
    /// Prayer points.
    Prayer,
}

/// A full stat block. Used for both base (maximum) and current levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Attack level.
    pub attack: i32,
    /// Strength level.
    pub strength: i32,
    /// Defence level.
    pub defence: i32,
    /// Ranged level.
    pub ranged: i32,
    /// Magic level.
    pub magic: i32,
    /// Hitpoints.
    pub hitpoint: i32,
    /// Prayer level.
    pub prayer: i32,
}

impl Stats {
    /// Every skill at the same level.
    #[must_use]
    pub const fn uniform(level: i32) -> Self {
        Self {
            attack: level,
            strength: level,
            defence: level,
            ranged: level,
            magic: level,
            hitpoint: level,
            prayer: level,
        }
    }

    /// Level of a single skill.
    #[must_use]
    pub const fn get(&self, skill: Skill) -> i32 {
        match skill {
            Skill::Attack => self.attack,
            Skill::Strength => self.strength,
            Skill::Defence => self.defence,
            Skill::Ranged => self.ranged,
            Skill::Magic => self.magic,
            Skill::Hitpoint => self.hitpoint,
            Skill::Prayer => self.prayer,
        }
    }

    /// Mutable access to a single skill.
    pub fn get_mut(&mut self, skill: Skill) -> &mut i32 {
        match skill {
            Skill::Attack => &mut self.attack,
            Skill::Strength => &mut self.strength,
            Skill::Defence => &mut self.defence,
            Skill::Ranged => &mut self.ranged,
            Skill::Magic => &mut self.magic,
            Skill::Hitpoint => &mut self.hitpoint,
            Skill::Prayer => &mut self.prayer,
        }
    }
}

// ============================================================================
// Attack Types & Equipment Bonuses
// ============================================================================

/// Melee damage variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeleeType {
    /// Daggers, spears.
    Stab,
    /// Swords, whips.
    Slash,
    /// Maces, fists.
    #[default]
    Crush,
}

/// The equipment-bonus column an attack reads and the defender defends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
    /// Stab melee.
    Stab,
    /// Slash melee.
    Slash,
    /// Crush melee.
    Crush,
    /// Projectiles.
    Ranged,
    /// Spells.
    Magic,
}

impl From<MeleeType> for AttackType {
    fn from(melee: MeleeType) -> Self {
        match melee {
            MeleeType::Stab => Self::Stab,
            MeleeType::Slash => Self::Slash,
            MeleeType::Crush => Self::Crush,
        }
    }
}

/// Broad combat class of a weapon or attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatClass {
    /// Stab, slash or crush.
    Melee,
    /// Bows, crossbows, thrown weapons.
    Ranged,
    /// Spells.
    Magic,
}

/// One bonus per attack type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleBonuses {
    /// Stab bonus.
    pub stab: i32,
    /// Slash bonus.
    pub slash: i32,
    /// Crush bonus.
    pub crush: i32,
    /// Magic bonus.
    pub magic: i32,
    /// Ranged bonus.
    pub ranged: i32,
}

impl StyleBonuses {
    /// Bonus for an attack type.
    #[must_use]
    pub const fn get(&self, attack_type: AttackType) -> i32 {
        match attack_type {
            AttackType::Stab => self.stab,
            AttackType::Slash => self.slash,
            AttackType::Crush => self.crush,
            AttackType::Ranged => self.ranged,
            AttackType::Magic => self.magic,
        }
    }
}

impl Add for StyleBonuses {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            stab: self.stab + rhs.stab,
            slash: self.slash + rhs.slash,
            crush: self.crush + rhs.crush,
            magic: self.magic + rhs.magic,
            ranged: self.ranged + rhs.ranged,
        }
    }
}

/// Scalar equipment bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherBonuses {
    /// Melee strength bonus.
    pub melee_strength: i32,
    /// Ranged strength bonus.
    pub ranged_strength: i32,
    /// Magic damage bonus, in percent.
    pub magic_damage: i32,
    /// Prayer bonus.
    pub prayer: i32,
}

impl Add for OtherBonuses {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            melee_strength: self.melee_strength + rhs.melee_strength,
            ranged_strength: self.ranged_strength + rhs.ranged_strength,
            magic_damage: self.magic_damage + rhs.magic_damage,
            prayer: self.prayer + rhs.prayer,
        }
    }
}

/// Complete bonus table for a unit (sum of its equipment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bonuses {
    /// Attack bonus per type.
    pub attack: StyleBonuses,
    /// Defence bonus per type.
    pub defence: StyleBonuses,
    /// Strength and damage bonuses.
    pub other: OtherBonuses,
}

impl Add for Bonuses {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            attack: self.attack + rhs.attack,
            defence: self.defence + rhs.defence,
            other: self.other + rhs.other,
        }
    }
}

// ============================================================================
// Prayers
// ============================================================================

/// Prayers that affect combat.
///
/// A unit may hold at most one protection prayer and one offensive prayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Prayer {
    /// Blocks melee damage.
    ProtectFromMelee,
    /// Blocks ranged damage.
    ProtectFromMissiles,
    /// Blocks magic damage.
    ProtectFromMagic,
    /// Melee: +15% attack, +18% strength, +20% defence.
    Chivalry,
    /// Melee: +20% attack, +23% strength, +25% defence.
    Piety,
    /// Ranged: +15% accuracy and strength.
    EagleEye,
    /// Ranged: +20% accuracy, +23% strength, +25% defence.
    Rigour,
    /// Magic: +15% accuracy and magic defence.
    MysticMight,
    /// Magic: +25% accuracy, magic defence and defence.
    Augury,
}

impl Prayer {
    /// Whether this is an overhead protection prayer.
    #[must_use]
    pub const fn is_protection(self) -> bool {
        matches!(
            self,
            Self::ProtectFromMelee | Self::ProtectFromMissiles | Self::ProtectFromMagic
        )
    }

    /// Whether two prayers cannot be active together.
    ///
    /// Protection prayers exclude each other, as do offensive prayers.
    #[must_use]
    pub const fn conflicts_with(self, other: Self) -> bool {
        self.is_protection() == other.is_protection()
    }

    /// Whether this prayer protects against attacks of the given class.
    #[must_use]
    pub const fn protects_against(self, class: CombatClass) -> bool {
        matches!(
            (self, class),
            (Self::ProtectFromMelee, CombatClass::Melee)
                | (Self::ProtectFromMissiles, CombatClass::Ranged)
                | (Self::ProtectFromMagic, CombatClass::Magic)
        )
    }

    /// Accuracy multiplier in percent for attacks of `class`.
    #[must_use]
    pub const fn accuracy_percent(self, class: CombatClass) -> i64 {
        match (self, class) {
            (Self::Chivalry, CombatClass::Melee) => 115,
            (Self::Piety, CombatClass::Melee) => 120,
            (Self::EagleEye, CombatClass::Ranged) => 115,
            (Self::Rigour, CombatClass::Ranged) => 120,
            (Self::MysticMight, CombatClass::Magic) => 115,
            (Self::Augury, CombatClass::Magic) => 125,
            _ => 100,
        }
    }

    /// Strength multiplier in percent for attacks of `class`.
    #[must_use]
    pub const fn strength_percent(self, class: CombatClass) -> i64 {
        match (self, class) {
            (Self::Chivalry, CombatClass::Melee) => 118,
            (Self::Piety, CombatClass::Melee) => 123,
            (Self::EagleEye, CombatClass::Ranged) => 115,
            (Self::Rigour, CombatClass::Ranged) => 123,
            _ => 100,
        }
    }

    /// Defence level multiplier in percent.
    #[must_use]
    pub const fn defence_percent(self) -> i64 {
        match self {
            Self::Chivalry => 120,
            Self::Piety | Self::Rigour | Self::Augury => 125,
            _ => 100,
        }
    }

    /// Magic level multiplier in percent when defending against magic.
    #[must_use]
    pub const fn magic_defence_percent(self) -> i64 {
        match self {
            Self::MysticMight => 115,
            Self::Augury => 125,
            _ => 100,
        }
    }
}

// ============================================================================
// Stances
// ============================================================================

/// A combat posture. Shifts invisible level bonuses and experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    /// Melee/ranged accuracy focus.
    Accurate,
    /// Melee strength focus.
    Aggressive,
    /// Melee defence focus.
    Defensive,
    /// Melee: a little of everything.
    Controlled,
    /// Ranged: one tick faster.
    Rapid,
    /// Ranged: extra range and defence.
    Longrange,
    /// Magic: standard casting.
    Autocast,
    /// Magic: casting with defence experience.
    DefensiveAutocast,
}

/// Invisible bonuses granted by a stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StanceBonus {
    /// Added to the effective accuracy level.
    pub attack: i64,
    /// Added to the effective strength level.
    pub strength: i64,
    /// Added to the effective defence level.
    pub defence: i64,
    /// Change to attack speed in ticks.
    pub speed: i32,
    /// Change to attack range in tiles.
    pub range: i32,
}

impl Stance {
    /// Stances offered by weapons of a class, default first.
    #[must_use]
    pub const fn offered_by(class: CombatClass) -> &'static [Stance] {
        match class {
            CombatClass::Melee => &[
                Self::Accurate,
                Self::Aggressive,
                Self::Defensive,
                Self::Controlled,
            ],
            CombatClass::Ranged => &[Self::Accurate, Self::Rapid, Self::Longrange],
            CombatClass::Magic => &[Self::Autocast, Self::DefensiveAutocast],
        }
    }

    /// Default stance for a weapon class.
    #[must_use]
    pub const fn default_for(class: CombatClass) -> Self {
        Self::offered_by(class)[0]
    }

    /// Bonuses this stance grants to attacks of `class`.
    #[must_use]
    pub const fn bonus(self, class: CombatClass) -> StanceBonus {
        let none = StanceBonus {
            attack: 0,
            strength: 0,
            defence: 0,
            speed: 0,
            range: 0,
        };
        match (class, self) {
            (CombatClass::Melee, Self::Accurate) => StanceBonus { attack: 3, ..none },
            (CombatClass::Melee, Self::Aggressive) => StanceBonus {
                strength: 3,
                ..none
            },
            (CombatClass::Melee, Self::Defensive) => StanceBonus { defence: 3, ..none },
            (CombatClass::Melee, Self::Controlled) => StanceBonus {
                attack: 1,
                strength: 1,
                defence: 1,
                ..none
            },
            (CombatClass::Ranged, Self::Accurate) => StanceBonus {
                attack: 3,
                strength: 3,
                ..none
            },
            (CombatClass::Ranged, Self::Rapid) => StanceBonus { speed: -1, ..none },
            (CombatClass::Ranged, Self::Longrange) => StanceBonus {
                defence: 3,
                range: 2,
                ..none
            },
            (CombatClass::Magic, Self::DefensiveAutocast) => StanceBonus { defence: 3, ..none },
            _ => none,
        }
    }
}

// ============================================================================
// Roles & Experience
// ============================================================================

/// Whether a unit is player-controlled (primary) or an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitRole {
    /// Primary, player-controlled actor. Acts after every NPC each tick.
    Player,
    /// Non-primary actor.
    #[default]
    Npc,
}

impl UnitRole {
    /// Whether this is the primary (player) role.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Accumulated experience per skill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Experience {
    totals: BTreeMap<Skill, Fixed>,
}

impl Experience {
    /// Add experience to a skill.
    pub fn add(&mut self, skill: Skill, amount: Fixed) {
        *self.totals.entry(skill).or_insert(Fixed::ZERO) += amount;
    }

    /// Total experience earned in a skill.
    #[must_use]
    pub fn get(&self, skill: Skill) -> Fixed {
        self.totals.get(&skill).copied().unwrap_or(Fixed::ZERO)
    }

    /// Iterate over skills with experience, in skill order.
    pub fn iter(&self) -> impl Iterator<Item = (Skill, Fixed)> + '_ {
        self.totals.iter().map(|(s, xp)| (*s, *xp))
    }

    /// Whether no experience has been earned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_get_mut() {
        let mut stats = Stats::uniform(50);
        *stats.get_mut(Skill::Defence) -= 10;
        assert_eq!(stats.get(Skill::Defence), 40);
        assert_eq!(stats.get(Skill::Attack), 50);
    }

    #[test]
    fn test_bonuses_add() {
        let a = Bonuses {
            attack: StyleBonuses {
                slash: 82,
                ..Default::default()
            },
            other: OtherBonuses {
                melee_strength: 82,
                ..Default::default()
            },
            ..Default::default()
        };
        let b = Bonuses {
            attack: StyleBonuses {
                slash: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let sum = a + b;
        assert_eq!(sum.attack.get(AttackType::Slash), 92);
        assert_eq!(sum.other.melee_strength, 82);
    }

    #[test]
    fn test_protection_prayers() {
        assert!(Prayer::ProtectFromMagic.protects_against(CombatClass::Magic));
        assert!(!Prayer::ProtectFromMagic.protects_against(CombatClass::Ranged));
        assert!(!Prayer::Piety.is_protection());
    }

    #[test]
    fn test_prayer_multipliers_only_apply_to_their_class() {
        assert_eq!(Prayer::Piety.accuracy_percent(CombatClass::Melee), 120);
        assert_eq!(Prayer::Piety.accuracy_percent(CombatClass::Ranged), 100);
        assert_eq!(Prayer::Rigour.strength_percent(CombatClass::Ranged), 123);
        assert_eq!(Prayer::Augury.magic_defence_percent(), 125);
    }

    #[test]
    fn test_stance_bonuses() {
        assert_eq!(Stance::Aggressive.bonus(CombatClass::Melee).strength, 3);
        assert_eq!(Stance::Rapid.bonus(CombatClass::Ranged).speed, -1);
        assert_eq!(Stance::Longrange.bonus(CombatClass::Ranged).range, 2);
        // A melee stance on a magic weapon grants nothing.
        assert_eq!(
            Stance::Aggressive.bonus(CombatClass::Magic),
            StanceBonus::default()
        );
    }

    #[test]
    fn test_default_stances() {
        assert_eq!(Stance::default_for(CombatClass::Melee), Stance::Accurate);
        assert_eq!(Stance::default_for(CombatClass::Magic), Stance::Autocast);
    }

    #[test]
    fn test_experience_accumulates() {
        let mut xp = Experience::default();
        xp.add(Skill::Attack, Fixed::from_num(40));
        xp.add(Skill::Attack, Fixed::from_num(8));
        assert_eq!(xp.get(Skill::Attack), Fixed::from_num(48));
        assert_eq!(xp.get(Skill::Magic), Fixed::ZERO);
    }
}
